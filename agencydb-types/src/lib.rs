//! Shared schema contracts (schemas-as-code) for the agency workspace database.
//!
//! # Design constraints
//! - Each table is declared exactly once in [`tables`]; its `Row`, `Insert` and `Update`
//!   shapes are derived from that declaration and cannot drift from each other.
//! - Enum-typed columns reference the Rust enums in [`enums`] directly.
//! - The declarations mirror the live `public` schema. Differences are reported by the
//!   drift check in `agencydb-contract`, never patched by hand here.

pub mod column;
pub mod enums;
pub mod json;
mod present;
pub mod report;
pub mod snapshot;
pub mod table;
pub mod tables;

pub use column::{ColumnDef, ColumnKind, ColumnValue, Timestamp};
pub use enums::{EnumDef, StringEnum, UnknownVariant};
pub use json::Json;
pub use table::{FieldContract, ForeignKey, Shape, Table, TableDef, UnknownShape};

/// Schema identifiers.
pub mod schema {
    use crate::table::Shape;

    /// Database schema the tables live in.
    pub const DB_SCHEMA: &str = "public";

    pub const AGENCYDB_DRIFT_V1: &str = "agencydb.drift.v1";
    pub const AGENCYDB_SNAPSHOT_V1: &str = "agencydb.snapshot.v1";

    /// Identifier of the exported JSON Schema for one table shape, e.g. `agencydb.tickets.insert.v1`.
    pub fn table_schema_id(table: &str, shape: Shape) -> String {
        format!("agencydb.{}.{}.v1", table, shape.as_str())
    }
}
