//! Runtime side of the agencydb schema contracts.
//!
//! The generated types in `agencydb-types` give compile-time checking. This crate covers the
//! boundary where payloads arrive as raw JSON:
//! - [`registry`] resolves tables and enums by name.
//! - [`validate`] checks a payload against a table shape and reports every violation.
//! - [`json_schema`] exports each shape as a JSON Schema document.
//! - [`detect_drift`] compares the registry with an introspection snapshot of the live schema.

mod drift;
mod error;
mod json_schema;
pub mod registry;
mod validate;

pub use drift::{
    Drift, SnapshotLoadError, detect_drift, detect_drift_ignoring, drift_report, load_snapshot,
};
pub use error::{ContractError, ContractResult};
pub use json_schema::{SchemaValidator, json_schema};
pub use validate::{
    ShapeMismatch, Violation, ViolationKind, decode_insert, decode_row, decode_update, validate,
};
