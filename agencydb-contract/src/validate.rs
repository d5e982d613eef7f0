use agencydb_types::json::type_name;
use agencydb_types::{ColumnKind, Shape, Table, TableDef};
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::error::{ContractError, ContractResult};

/// A payload rejected by a table shape, with every violation found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{table}.{shape} payload rejected: {}", join(.violations))]
pub struct ShapeMismatch {
    pub table: String,
    pub shape: Shape,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Offending column; `None` when the payload itself is wrong.
    pub field: Option<String>,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    NotAnObject { found: &'static str },
    MissingField,
    UnknownField,
    NullNotAllowed,
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    NotInEnum {
        enum_name: &'static str,
        value: String,
    },
    InvalidTimestamp { value: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "{field}: ")?;
        }
        match &self.kind {
            ViolationKind::NotAnObject { found } => write!(f, "expected an object, found {found}"),
            ViolationKind::MissingField => f.write_str("missing required field"),
            ViolationKind::UnknownField => f.write_str("unknown field"),
            ViolationKind::NullNotAllowed => f.write_str("null is not allowed"),
            ViolationKind::WrongType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ViolationKind::NotInEnum { enum_name, value } => {
                write!(f, "'{value}' is not a value of {enum_name}")
            }
            ViolationKind::InvalidTimestamp { value } => {
                write!(f, "'{value}' is not an RFC 3339 timestamp")
            }
        }
    }
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checks `payload` against the `shape` of `table`.
///
/// Violations are reported in column declaration order, followed by unknown fields in key
/// order.
pub fn validate(table: &TableDef, shape: Shape, payload: &Value) -> Result<(), ShapeMismatch> {
    let mismatch = |violations| ShapeMismatch {
        table: table.name.to_string(),
        shape,
        violations,
    };

    let Some(object) = payload.as_object() else {
        return Err(mismatch(vec![Violation {
            field: None,
            kind: ViolationKind::NotAnObject {
                found: type_name(payload),
            },
        }]));
    };

    let mut violations = Vec::new();
    for field in table.contract(shape) {
        let kind = match object.get(field.column.name) {
            None if field.required => Some(ViolationKind::MissingField),
            None => None,
            Some(Value::Null) if !field.nullable => Some(ViolationKind::NullNotAllowed),
            Some(Value::Null) => None,
            Some(value) => check_value(&field.column.kind, value).err(),
        };
        if let Some(kind) = kind {
            violations.push(Violation {
                field: Some(field.column.name.to_string()),
                kind,
            });
        }
    }

    for key in object.keys() {
        if table.column(key).is_none() {
            violations.push(Violation {
                field: Some(key.clone()),
                kind: ViolationKind::UnknownField,
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        debug!(
            table = table.name,
            shape = %shape,
            violations = violations.len(),
            "payload rejected"
        );
        Err(mismatch(violations))
    }
}

fn check_value(kind: &ColumnKind, value: &Value) -> Result<(), ViolationKind> {
    let wrong_type = || ViolationKind::WrongType {
        expected: kind.label(),
        found: type_name(value),
    };

    match kind {
        ColumnKind::Text if value.is_string() => Ok(()),
        ColumnKind::Integer if value.as_i64().is_some() => Ok(()),
        ColumnKind::Boolean if value.is_boolean() => Ok(()),
        ColumnKind::Json => Ok(()),
        ColumnKind::Timestamp => {
            let s = value.as_str().ok_or_else(wrong_type)?;
            DateTime::parse_from_rfc3339(s)
                .map(|_| ())
                .map_err(|_| ViolationKind::InvalidTimestamp {
                    value: s.to_string(),
                })
        }
        ColumnKind::Enum(def) => {
            let s = value.as_str().ok_or_else(wrong_type)?;
            if def.contains(s) {
                Ok(())
            } else {
                Err(ViolationKind::NotInEnum {
                    enum_name: def.name,
                    value: s.to_string(),
                })
            }
        }
        _ => Err(wrong_type()),
    }
}

fn decode<S: DeserializeOwned>(table: &TableDef, shape: Shape, payload: Value) -> ContractResult<S> {
    validate(table, shape, &payload)?;
    serde_json::from_value(payload).map_err(|e| ContractError::Decode {
        table: table.name.to_string(),
        shape,
        message: e.to_string(),
    })
}

/// Validates and decodes a read result.
pub fn decode_row<T: Table>(payload: Value) -> ContractResult<T::Row> {
    decode(&T::DEF, Shape::Row, payload)
}

/// Validates and decodes an insert payload.
pub fn decode_insert<T: Table>(payload: Value) -> ContractResult<T::Insert> {
    decode(&T::DEF, Shape::Insert, payload)
}

/// Validates and decodes an update payload.
pub fn decode_update<T: Table>(payload: Value) -> ContractResult<T::Update> {
    decode(&T::DEF, Shape::Update, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agencydb_types::tables::{subscriptions, tickets};
    use serde_json::json;

    fn kinds(err: &ShapeMismatch) -> Vec<(Option<&str>, &ViolationKind)> {
        err.violations
            .iter()
            .map(|v| (v.field.as_deref(), &v.kind))
            .collect()
    }

    #[test]
    fn collects_every_violation_in_column_order() {
        let payload = json!({ "name": 7, "order": null, "extra": true });
        let err = validate(&tickets::DEF, Shape::Insert, &payload).expect_err("invalid");

        assert_eq!(
            kinds(&err),
            vec![
                (
                    Some("name"),
                    &ViolationKind::WrongType {
                        expected: "text",
                        found: "integer"
                    }
                ),
                (Some("lane_id"), &ViolationKind::MissingField),
                (Some("order"), &ViolationKind::NullNotAllowed),
                (Some("extra"), &ViolationKind::UnknownField),
            ]
        );
    }

    #[test]
    fn non_object_payload_is_rejected_once() {
        let err = validate(&tickets::DEF, Shape::Update, &json!([1, 2])).expect_err("array");
        assert_eq!(
            kinds(&err),
            vec![(None, &ViolationKind::NotAnObject { found: "array" })]
        );
    }

    #[test]
    fn enum_and_timestamp_values_are_checked() {
        let payload = json!({
            "plan": "price_free",
            "current_period_end_date": "next tuesday",
        });
        let err = validate(&subscriptions::DEF, Shape::Update, &payload).expect_err("invalid");
        assert_eq!(
            kinds(&err),
            vec![
                (
                    Some("current_period_end_date"),
                    &ViolationKind::InvalidTimestamp {
                        value: "next tuesday".to_string()
                    }
                ),
                (
                    Some("plan"),
                    &ViolationKind::NotInEnum {
                        enum_name: "plan_enum",
                        value: "price_free".to_string()
                    }
                ),
            ]
        );
    }

    #[test]
    fn mismatch_display_lists_violations() {
        let err = validate(&tickets::DEF, Shape::Insert, &json!({ "name": "x" }))
            .expect_err("lane_id missing");
        assert_eq!(
            err.to_string(),
            "tickets.insert payload rejected: lane_id: missing required field"
        );
    }

    #[test]
    fn floats_are_not_integers() {
        let err = validate(&tickets::DEF, Shape::Update, &json!({ "order": 1.5 }))
            .expect_err("float order");
        assert!(matches!(
            err.violations[0].kind,
            ViolationKind::WrongType {
                expected: "integer",
                found: "number"
            }
        ));
    }
}
