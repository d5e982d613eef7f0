use chrono::{DateTime, Utc};

use crate::enums::EnumDef;
use crate::json::Json;

/// Timestamp columns (`created_at`, `updated_at`, billing period ends).
pub type Timestamp = DateTime<Utc>;

/// Value type of a column, independent of nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Boolean,
    /// RFC 3339 text with an explicit offset.
    Timestamp,
    Json,
    Enum(EnumDef),
}

impl ColumnKind {
    /// Label used in diagnostics and rendered contracts.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKind::Text => "text",
            ColumnKind::Integer => "integer",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Json => "json",
            ColumnKind::Enum(def) => def.name,
        }
    }

    pub fn enum_def(&self) -> Option<&EnumDef> {
        match self {
            ColumnKind::Enum(def) => Some(def),
            _ => None,
        }
    }
}

/// Rust types that can back a column.
pub trait ColumnValue {
    const KIND: ColumnKind;
}

impl ColumnValue for String {
    const KIND: ColumnKind = ColumnKind::Text;
}

impl ColumnValue for i64 {
    const KIND: ColumnKind = ColumnKind::Integer;
}

impl ColumnValue for bool {
    const KIND: ColumnKind = ColumnKind::Boolean;
}

impl ColumnValue for Timestamp {
    const KIND: ColumnKind = ColumnKind::Timestamp;
}

impl ColumnValue for Json {
    const KIND: ColumnKind = ColumnKind::Json;
}

/// One declared column of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Row type admits `null`.
    pub nullable: bool,
    /// The schema declares a default (server-generated value or implicit `null`).
    pub has_default: bool,
}
