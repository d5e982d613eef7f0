//! Error types for agencydb-contract.
//!
//! Errors fall into two classes:
//! - Contract blocks (exit code 2): a payload does not match its shape.
//! - Runtime errors (exit code 1): unknown names, schema compilation, decode failures.

use agencydb_types::Shape;
use thiserror::Error;

use crate::validate::ShapeMismatch;

#[derive(Debug, Error)]
pub enum ContractError {
    /// The payload does not match the table shape.
    #[error(transparent)]
    Mismatch(#[from] ShapeMismatch),

    #[error("unknown table '{name}'")]
    UnknownTable { name: String },

    #[error("unknown enum '{name}'")]
    UnknownEnum { name: String },

    /// The exported JSON Schema could not be compiled.
    #[error("json schema for {table}.{shape}: {message}")]
    JsonSchema {
        table: String,
        shape: Shape,
        message: String,
    },

    /// A structurally valid payload failed typed decoding.
    #[error("decode {table}.{shape}: {message}")]
    Decode {
        table: String,
        shape: Shape,
        message: String,
    },
}

impl ContractError {
    /// Returns true if the payload was rejected by its contract (exit code 2).
    pub fn is_mismatch(&self) -> bool {
        matches!(self, ContractError::Mismatch(_))
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_mismatch() { 2 } else { 1 }
    }
}

pub type ContractResult<T> = Result<T, ContractError>;

#[cfg(test)]
mod tests {
    use super::ContractError;
    use crate::validate::{ShapeMismatch, Violation, ViolationKind};
    use agencydb_types::Shape;

    #[test]
    fn mismatch_reports_exit_code_2() {
        let err = ContractError::from(ShapeMismatch {
            table: "tickets".to_string(),
            shape: Shape::Insert,
            violations: vec![Violation {
                field: Some("lane_id".to_string()),
                kind: ViolationKind::MissingField,
            }],
        });
        assert!(err.is_mismatch());
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("lane_id"));
    }

    #[test]
    fn unknown_table_reports_exit_code_1() {
        let err = ContractError::UnknownTable {
            name: "leads".to_string(),
        };
        assert!(!err.is_mismatch());
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "unknown table 'leads'");
    }
}
