//! Drift between the declared registry and an introspection snapshot of the live schema.

use std::collections::BTreeSet;
use std::fmt;

use agencydb_types::report::{
    DriftReport, ReportCounts, ReportFinding, ReportRunInfo, ReportStatus, ReportToolInfo,
    ReportVerdict,
};
use agencydb_types::schema::AGENCYDB_DRIFT_V1;
use agencydb_types::snapshot::{SchemaSnapshot, SnapshotColumn};
use agencydb_types::{ColumnDef, ColumnKind, TableDef, enums, tables};
use camino::Utf8Path;
use chrono::Utc;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::registry::sql_type;

/// One difference between the registry and the live schema.
///
/// "Declared" is the registry side, "live" the snapshot side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    MissingTable {
        table: String,
    },
    ExtraTable {
        table: String,
    },
    MissingColumn {
        table: String,
        column: String,
    },
    ExtraColumn {
        table: String,
        column: String,
    },
    NullabilityMismatch {
        table: String,
        column: String,
        declared: bool,
        live: bool,
    },
    DefaultMismatch {
        table: String,
        column: String,
        declared: bool,
        live: bool,
    },
    TypeMismatch {
        table: String,
        column: String,
        declared: String,
        live: String,
    },
    MissingEnum {
        name: String,
    },
    ExtraEnum {
        name: String,
    },
    /// Values are compared as sets; order is not drift.
    EnumValuesMismatch {
        name: String,
        missing: Vec<String>,
        extra: Vec<String>,
    },
}

impl Drift {
    /// Stable code used in reports.
    pub fn code(&self) -> &'static str {
        match self {
            Drift::MissingTable { .. } => "missing_table",
            Drift::ExtraTable { .. } => "extra_table",
            Drift::MissingColumn { .. } => "missing_column",
            Drift::ExtraColumn { .. } => "extra_column",
            Drift::NullabilityMismatch { .. } => "nullability_mismatch",
            Drift::DefaultMismatch { .. } => "default_mismatch",
            Drift::TypeMismatch { .. } => "type_mismatch",
            Drift::MissingEnum { .. } => "missing_enum",
            Drift::ExtraEnum { .. } => "extra_enum",
            Drift::EnumValuesMismatch { .. } => "enum_values_mismatch",
        }
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            Drift::MissingTable { table }
            | Drift::ExtraTable { table }
            | Drift::MissingColumn { table, .. }
            | Drift::ExtraColumn { table, .. }
            | Drift::NullabilityMismatch { table, .. }
            | Drift::DefaultMismatch { table, .. }
            | Drift::TypeMismatch { table, .. } => Some(table.as_str()),
            Drift::MissingEnum { .. } | Drift::ExtraEnum { .. } | Drift::EnumValuesMismatch { .. } => {
                None
            }
        }
    }

    pub fn column(&self) -> Option<&str> {
        match self {
            Drift::MissingColumn { column, .. }
            | Drift::ExtraColumn { column, .. }
            | Drift::NullabilityMismatch { column, .. }
            | Drift::DefaultMismatch { column, .. }
            | Drift::TypeMismatch { column, .. } => Some(column.as_str()),
            _ => None,
        }
    }

    fn data(&self) -> Option<Value> {
        match self {
            Drift::NullabilityMismatch { declared, live, .. }
            | Drift::DefaultMismatch { declared, live, .. } => {
                Some(json!({ "declared": declared, "live": live }))
            }
            Drift::TypeMismatch { declared, live, .. } => {
                Some(json!({ "declared": declared, "live": live }))
            }
            Drift::MissingEnum { name } | Drift::ExtraEnum { name } => Some(json!({ "enum": name })),
            Drift::EnumValuesMismatch {
                name,
                missing,
                extra,
            } => Some(json!({ "enum": name, "missing": missing, "extra": extra })),
            _ => None,
        }
    }
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Drift::MissingTable { table } => write!(f, "table {table} is missing from the live schema"),
            Drift::ExtraTable { table } => write!(f, "table {table} exists only in the live schema"),
            Drift::MissingColumn { table, column } => {
                write!(f, "column {table}.{column} is missing from the live schema")
            }
            Drift::ExtraColumn { table, column } => {
                write!(f, "column {table}.{column} exists only in the live schema")
            }
            Drift::NullabilityMismatch {
                table,
                column,
                declared,
                live,
            } => write!(
                f,
                "column {table}.{column} is {} but the live schema has it {}",
                nullability(*declared),
                nullability(*live)
            ),
            Drift::DefaultMismatch {
                table,
                column,
                declared,
                live,
            } => write!(
                f,
                "column {table}.{column} {} a default but the live schema {}",
                if *declared { "declares" } else { "has no" },
                if *live { "has one" } else { "does not" }
            ),
            Drift::TypeMismatch {
                table,
                column,
                declared,
                live,
            } => write!(
                f,
                "column {table}.{column} is declared {declared} but is {live} in the live schema"
            ),
            Drift::MissingEnum { name } => write!(f, "enum {name} is missing from the live schema"),
            Drift::ExtraEnum { name } => write!(f, "enum {name} exists only in the live schema"),
            Drift::EnumValuesMismatch {
                name,
                missing,
                extra,
            } => {
                write!(f, "enum {name} differs")?;
                if !missing.is_empty() {
                    write!(f, "; missing live: {}", missing.join(", "))?;
                }
                if !extra.is_empty() {
                    write!(f, "; extra live: {}", extra.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

fn nullability(nullable: bool) -> &'static str {
    if nullable { "nullable" } else { "not null" }
}

/// Compares every declared table and enum with `snapshot`.
pub fn detect_drift(snapshot: &SchemaSnapshot) -> Vec<Drift> {
    detect_drift_ignoring(snapshot, &[])
}

/// Like [`detect_drift`], skipping the named tables on both sides.
///
/// Order is deterministic: declared tables alphabetically with their columns in declaration
/// order, then extra live tables by name, then enums the same way.
pub fn detect_drift_ignoring(snapshot: &SchemaSnapshot, ignore_tables: &[String]) -> Vec<Drift> {
    let ignored = |name: &str| ignore_tables.iter().any(|t| t == name);
    let mut out = Vec::new();

    for table in tables::ALL.iter().filter(|t| !ignored(t.name)) {
        match snapshot.table(table.name) {
            None => out.push(Drift::MissingTable {
                table: table.name.to_string(),
            }),
            Some(live) => table_drift(table, &live.columns, &mut out),
        }
    }

    let extra_tables: BTreeSet<&str> = snapshot
        .tables
        .iter()
        .map(|t| t.name.as_str())
        .filter(|name| !ignored(*name) && !tables::ALL.iter().any(|t| t.name == *name))
        .collect();
    out.extend(extra_tables.into_iter().map(|name| Drift::ExtraTable {
        table: name.to_string(),
    }));

    for def in enums::ENUMS {
        match snapshot.enum_values(def.name) {
            None => out.push(Drift::MissingEnum {
                name: def.name.to_string(),
            }),
            Some(live) => {
                let missing: Vec<String> = def
                    .values
                    .iter()
                    .filter(|v| !live.iter().any(|l| l.as_str() == **v))
                    .map(|v| v.to_string())
                    .collect();
                let extra: Vec<String> = live
                    .iter()
                    .filter(|l| !def.contains(l.as_str()))
                    .cloned()
                    .collect();
                if !missing.is_empty() || !extra.is_empty() {
                    out.push(Drift::EnumValuesMismatch {
                        name: def.name.to_string(),
                        missing,
                        extra,
                    });
                }
            }
        }
    }

    let extra_enums: BTreeSet<&str> = snapshot
        .enums
        .iter()
        .map(|e| e.name.as_str())
        .filter(|name| !enums::ENUMS.iter().any(|e| e.name == *name))
        .collect();
    out.extend(extra_enums.into_iter().map(|name| Drift::ExtraEnum {
        name: name.to_string(),
    }));

    debug!(drift = out.len(), "drift detection finished");
    out
}

fn table_drift(table: &TableDef, live: &[SnapshotColumn], out: &mut Vec<Drift>) {
    let at = |column: &str| (table.name.to_string(), column.to_string());

    for column in table.columns {
        let Some(live_column) = live.iter().find(|c| c.name == column.name) else {
            let (table, column) = at(column.name);
            out.push(Drift::MissingColumn { table, column });
            continue;
        };

        if !kind_matches(&column.kind, live_column) {
            let (table, col) = at(column.name);
            out.push(Drift::TypeMismatch {
                table,
                column: col,
                declared: declared_type(column),
                live: live_type(live_column),
            });
        }
        if column.nullable != live_column.is_nullable {
            let (table, col) = at(column.name);
            out.push(Drift::NullabilityMismatch {
                table,
                column: col,
                declared: column.nullable,
                live: live_column.is_nullable,
            });
        }
        // Nullable columns default to null whether or not the live schema says so.
        if !column.nullable && column.has_default != live_column.has_default {
            let (table, col) = at(column.name);
            out.push(Drift::DefaultMismatch {
                table,
                column: col,
                declared: column.has_default,
                live: live_column.has_default,
            });
        }
    }

    let extra: BTreeSet<&str> = live
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| table.column(name).is_none())
        .collect();
    for name in extra {
        let (table, column) = at(name);
        out.push(Drift::ExtraColumn { table, column });
    }
}

fn kind_matches(kind: &ColumnKind, live: &SnapshotColumn) -> bool {
    let data_type = live.data_type.to_ascii_lowercase();
    let ty = data_type.as_str();
    match kind {
        ColumnKind::Text => matches!(
            ty,
            "text" | "uuid" | "citext" | "character varying" | "varchar" | "character" | "char"
        ),
        ColumnKind::Integer => matches!(
            ty,
            "integer" | "bigint" | "smallint" | "int" | "int2" | "int4" | "int8"
        ),
        ColumnKind::Boolean => matches!(ty, "boolean" | "bool"),
        // Rows carry an offset, so a naive `timestamp without time zone` does not match.
        ColumnKind::Timestamp => {
            ty == "timestamptz" || (ty.starts_with("timestamp") && ty.ends_with(" with time zone"))
        }
        ColumnKind::Json => matches!(ty, "json" | "jsonb"),
        ColumnKind::Enum(def) => {
            live.enum_name.as_deref() == Some(def.name) || live.data_type == def.name
        }
    }
}

fn declared_type(column: &ColumnDef) -> String {
    match column.kind.enum_def() {
        Some(def) => format!("{} ({})", sql_type(&column.kind), def.name),
        None => sql_type(&column.kind).to_string(),
    }
}

fn live_type(column: &SnapshotColumn) -> String {
    match &column.enum_name {
        Some(name) => format!("{} ({})", column.data_type, name),
        None => column.data_type.clone(),
    }
}

#[derive(Debug, Error, Clone)]
pub enum SnapshotLoadError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("json parse error: {message}")]
    Json { message: String },
}

/// Reads an introspection snapshot from `path`.
pub fn load_snapshot(path: &Utf8Path) -> Result<SchemaSnapshot, SnapshotLoadError> {
    debug!(path = %path, "loading schema snapshot");
    let raw = fs_err::read_to_string(path).map_err(|e| SnapshotLoadError::Io {
        message: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| SnapshotLoadError::Json {
        message: e.to_string(),
    })
}

/// Builds the `agencydb.drift.v1` report for one comparison.
pub fn drift_report(
    drift: &[Drift],
    ignore_tables: &[String],
    tool: ReportToolInfo,
    snapshot: Option<&str>,
) -> DriftReport {
    let started_at = Utc::now().to_rfc3339();

    let status = if drift.is_empty() {
        ReportStatus::Pass
    } else {
        ReportStatus::Fail
    };

    let reasons: Vec<String> = drift
        .iter()
        .map(Drift::code)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let findings = drift
        .iter()
        .map(|d| ReportFinding {
            code: d.code().to_string(),
            message: d.to_string(),
            table: d.table().map(str::to_string),
            column: d.column().map(str::to_string),
            data: d.data(),
        })
        .collect();

    let tables_checked = tables::ALL
        .iter()
        .filter(|t| !ignore_tables.iter().any(|i| i == t.name))
        .count() as u64;

    DriftReport {
        schema: AGENCYDB_DRIFT_V1.to_string(),
        tool,
        run: ReportRunInfo {
            started_at,
            ended_at: Some(Utc::now().to_rfc3339()),
        },
        verdict: ReportVerdict {
            status,
            counts: ReportCounts {
                tables_checked,
                enums_checked: enums::ENUMS.len() as u64,
                drift: drift.len() as u64,
            },
            reasons,
        },
        findings,
        snapshot: snapshot.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use pretty_assertions::assert_eq;

    fn tool() -> ReportToolInfo {
        ReportToolInfo {
            name: "agencydb".to_string(),
            version: "0.0.0".to_string(),
        }
    }

    #[test]
    fn enum_value_order_is_not_drift() {
        let mut snapshot = registry::snapshot();
        let role = snapshot
            .enums
            .iter_mut()
            .find(|e| e.name == "role_enum")
            .expect("role_enum");
        role.values.reverse();
        assert_eq!(detect_drift(&snapshot), vec![]);
    }

    #[test]
    fn nullable_default_flag_is_not_compared() {
        let mut snapshot = registry::snapshot();
        let tickets = snapshot
            .tables
            .iter_mut()
            .find(|t| t.name == "tickets")
            .expect("tickets");
        for column in &mut tickets.columns {
            if column.is_nullable {
                column.has_default = false;
            }
        }
        assert_eq!(detect_drift(&snapshot), vec![]);
    }

    #[test]
    fn sql_type_aliases_satisfy_declared_columns() {
        let mut snapshot = registry::snapshot();
        let tags = snapshot
            .tables
            .iter_mut()
            .find(|t| t.name == "tags")
            .expect("tags");
        for column in &mut tags.columns {
            match column.name.as_str() {
                "id" => column.data_type = "uuid".to_string(),
                "name" => column.data_type = "character varying".to_string(),
                "created_at" => column.data_type = "timestamp(3) with time zone".to_string(),
                "updated_at" => column.data_type = "timestamptz".to_string(),
                _ => {}
            }
        }
        assert_eq!(detect_drift(&snapshot), vec![]);
    }

    #[test]
    fn timestamp_without_time_zone_is_a_type_mismatch() {
        let mut snapshot = registry::snapshot();
        let tags = snapshot
            .tables
            .iter_mut()
            .find(|t| t.name == "tags")
            .expect("tags");
        for column in &mut tags.columns {
            if column.name == "created_at" {
                column.data_type = "timestamp(3) without time zone".to_string();
            }
        }
        assert_eq!(
            detect_drift(&snapshot),
            vec![Drift::TypeMismatch {
                table: "tags".to_string(),
                column: "created_at".to_string(),
                declared: "timestamp with time zone".to_string(),
                live: "timestamp(3) without time zone".to_string(),
            }]
        );
    }

    #[test]
    fn report_fails_with_sorted_reason_codes() {
        let drift = vec![
            Drift::MissingTable {
                table: "tags".to_string(),
            },
            Drift::ExtraEnum {
                name: "color_enum".to_string(),
            },
            Drift::MissingTable {
                table: "media".to_string(),
            },
        ];
        let report = drift_report(&drift, &[], tool(), Some("live.json"));
        assert_eq!(report.schema, "agencydb.drift.v1");
        assert_eq!(report.verdict.status, ReportStatus::Fail);
        assert_eq!(report.verdict.reasons, vec!["extra_enum", "missing_table"]);
        assert_eq!(report.verdict.counts.drift, 3);
        assert_eq!(report.verdict.counts.tables_checked, 24);
        assert_eq!(report.findings[1].table, None);
        assert_eq!(report.findings[1].data, Some(json!({ "enum": "color_enum" })));
        assert_eq!(report.snapshot.as_deref(), Some("live.json"));
    }

    #[test]
    fn clean_report_passes() {
        let ignore = vec!["tags".to_string()];
        let report = drift_report(&[], &ignore, tool(), None);
        assert_eq!(report.verdict.status, ReportStatus::Pass);
        assert!(report.verdict.reasons.is_empty());
        assert_eq!(report.verdict.counts.tables_checked, 23);
        assert_eq!(report.verdict.counts.enums_checked, 6);
    }

    #[test]
    fn type_mismatch_names_both_sides() {
        let drift = Drift::TypeMismatch {
            table: "users".to_string(),
            column: "role".to_string(),
            declared: "USER-DEFINED (role_enum)".to_string(),
            live: "text".to_string(),
        };
        assert_eq!(
            drift.to_string(),
            "column users.role is declared USER-DEFINED (role_enum) but is text in the live schema"
        );
        assert_eq!(drift.code(), "type_mismatch");
        assert_eq!(drift.column(), Some("role"));
    }
}
