use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::column::ColumnDef;

/// The three access shapes derived from every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Returned by reads: every column present.
    Row,
    /// Accepted when creating a row: defaulted columns may be omitted.
    Insert,
    /// Accepted when patching a row: every column may be omitted.
    Update,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Row, Shape::Insert, Shape::Update];

    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Row => "row",
            Shape::Insert => "insert",
            Shape::Update => "update",
        }
    }

    /// Whether `column` must be present in a payload of this shape.
    ///
    /// Insert optionality follows declared defaults only; a nullable column without a
    /// default is still required on insert.
    pub fn requires(self, column: &ColumnDef) -> bool {
        match self {
            Shape::Row => true,
            Shape::Insert => !column.has_default,
            Shape::Update => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownShape(pub String);

impl fmt::Display for UnknownShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown shape '{}' (expected row, insert or update)", self.0)
    }
}

impl std::error::Error for UnknownShape {}

impl FromStr for Shape {
    type Err = UnknownShape;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "row" => Ok(Shape::Row),
            "insert" => Ok(Shape::Insert),
            "update" => Ok(Shape::Update),
            _ => Err(UnknownShape(s.to_string())),
        }
    }
}

/// Foreign key from a column to the `id` of another table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: &'static str,
}

/// Declared structure of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    pub foreign_keys: &'static [ForeignKey],
}

/// A column as seen through one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldContract<'a> {
    pub column: &'a ColumnDef,
    /// Must be present in the payload.
    pub required: bool,
    /// Admits `null` when present.
    pub nullable: bool,
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Field contracts of `shape`, in declaration order.
    pub fn contract(&self, shape: Shape) -> Vec<FieldContract<'static>> {
        self.columns
            .iter()
            .map(|column| FieldContract {
                column,
                required: shape.requires(column),
                nullable: column.nullable,
            })
            .collect()
    }

    pub fn required_columns(&self, shape: Shape) -> Vec<&'static str> {
        self.contract(shape)
            .into_iter()
            .filter(|f| f.required)
            .map(|f| f.column.name)
            .collect()
    }

    pub fn references(&self, column: &str) -> Option<&'static str> {
        self.foreign_keys
            .iter()
            .find(|fk| fk.column == column)
            .map(|fk| fk.references)
    }
}

/// Typed access to one table's contracts.
pub trait Table {
    const NAME: &'static str;
    const DEF: TableDef;

    type Row: Serialize + DeserializeOwned + Clone + fmt::Debug;
    type Insert: Serialize + DeserializeOwned + Clone + fmt::Debug;
    type Update: Serialize + DeserializeOwned + Clone + fmt::Debug + Default + From<Self::Row>;
}
