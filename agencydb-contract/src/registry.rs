//! Name-based lookup over the declared tables and enums.

use agencydb_types::schema::AGENCYDB_SNAPSHOT_V1;
use agencydb_types::snapshot::{SchemaSnapshot, SnapshotColumn, SnapshotEnum, SnapshotTable};
use agencydb_types::{ColumnKind, EnumDef, Shape, TableDef, enums, tables};
use serde_json::Value;

use crate::error::{ContractError, ContractResult};
use crate::validate::validate;

pub fn tables() -> &'static [TableDef] {
    tables::ALL
}

pub fn table(name: &str) -> ContractResult<&'static TableDef> {
    tables::ALL
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| ContractError::UnknownTable {
            name: name.to_string(),
        })
}

pub fn enums() -> &'static [EnumDef] {
    enums::ENUMS
}

pub fn enum_def(name: &str) -> ContractResult<&'static EnumDef> {
    enums::ENUMS
        .iter()
        .find(|e| e.name == name)
        .ok_or_else(|| ContractError::UnknownEnum {
            name: name.to_string(),
        })
}

/// Validates `payload` against the `shape` of the table called `name`.
pub fn validate_named(name: &str, shape: Shape, payload: &Value) -> ContractResult<()> {
    let table = table(name)?;
    validate(table, shape, payload)?;
    Ok(())
}

/// SQL type the introspection tool reports for a column kind.
pub fn sql_type(kind: &ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Text => "text",
        ColumnKind::Integer => "integer",
        ColumnKind::Boolean => "boolean",
        ColumnKind::Timestamp => "timestamp with time zone",
        ColumnKind::Json => "jsonb",
        ColumnKind::Enum(_) => "USER-DEFINED",
    }
}

/// The registry expressed as an introspection snapshot.
///
/// Comparing this snapshot with [`detect_drift`](crate::detect_drift) yields no drift.
pub fn snapshot() -> SchemaSnapshot {
    let tables = tables::ALL
        .iter()
        .map(|table| SnapshotTable {
            name: table.name.to_string(),
            columns: table
                .columns
                .iter()
                .map(|column| SnapshotColumn {
                    name: column.name.to_string(),
                    data_type: sql_type(&column.kind).to_string(),
                    is_nullable: column.nullable,
                    has_default: column.has_default,
                    enum_name: column.kind.enum_def().map(|def| def.name.to_string()),
                })
                .collect(),
        })
        .collect();

    let enums = enums::ENUMS
        .iter()
        .map(|def| SnapshotEnum {
            name: def.name.to_string(),
            values: def.values.iter().map(|v| v.to_string()).collect(),
        })
        .collect();

    SchemaSnapshot {
        schema: Some(AGENCYDB_SNAPSHOT_V1.to_string()),
        tables,
        enums,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_by_name() {
        assert_eq!(table("tickets").expect("tickets").name, "tickets");
        let err = table("leads").expect_err("unknown");
        assert_eq!(err.exit_code(), 1);
        assert_eq!(enum_def("role_enum").expect("role").values.len(), 4);
        assert!(enum_def("status_enum").is_err());
    }

    #[test]
    fn validate_named_separates_unknown_table_from_mismatch() {
        let err = validate_named("tickets", Shape::Insert, &json!({})).expect_err("mismatch");
        assert!(err.is_mismatch());
        let err = validate_named("leads", Shape::Insert, &json!({})).expect_err("unknown");
        assert!(!err.is_mismatch());
    }

    #[test]
    fn snapshot_mirrors_registry() {
        let snap = snapshot();
        assert_eq!(snap.tables.len(), tables().len());
        assert_eq!(snap.enums.len(), enums().len());
        let plan = snap
            .table("subscriptions")
            .and_then(|t| t.column("plan"))
            .expect("subscriptions.plan");
        assert_eq!(plan.data_type, "USER-DEFINED");
        assert_eq!(plan.enum_name.as_deref(), Some("plan_enum"));
        assert!(plan.is_nullable);
    }
}
