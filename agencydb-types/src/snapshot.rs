//! Introspection snapshot of the live schema, as exported by the schema-introspection tool.
//!
//! Loading is tolerant:
//! - Unknown fields are ignored.
//! - `is_nullable` / `has_default` accept booleans or `information_schema` style `"YES"`/`"NO"`.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Schema identifier, e.g. "agencydb.snapshot.v1".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub tables: Vec<SnapshotTable>,

    #[serde(default)]
    pub enums: Vec<SnapshotEnum>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTable {
    pub name: String,

    #[serde(default)]
    pub columns: Vec<SnapshotColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotColumn {
    pub name: String,

    /// SQL type as reported by the database, e.g. "text", "timestamp with time zone",
    /// or "USER-DEFINED" for enums.
    pub data_type: String,

    #[serde(deserialize_with = "flag")]
    pub is_nullable: bool,

    #[serde(default, deserialize_with = "flag")]
    pub has_default: bool,

    /// Enum type name when `data_type` is "USER-DEFINED".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEnum {
    pub name: String,

    #[serde(default)]
    pub values: Vec<String>,
}

impl SchemaSnapshot {
    pub fn table(&self, name: &str) -> Option<&SnapshotTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn enum_values(&self, name: &str) -> Option<&[String]> {
        self.enums
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.values.as_slice())
    }
}

impl SnapshotTable {
    pub fn column(&self, name: &str) -> Option<&SnapshotColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.to_ascii_uppercase().as_str() {
            "YES" | "TRUE" => Ok(true),
            "NO" | "FALSE" => Ok(false),
            _ => Err(serde::de::Error::custom(format!(
                "expected YES/NO or a boolean, got '{s}'"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::SchemaSnapshot;

    #[test]
    fn snapshot_accepts_information_schema_flags() {
        let raw = r#"{
            "tables": [{
                "name": "tags",
                "columns": [
                    { "name": "id", "data_type": "uuid", "is_nullable": "NO", "has_default": "YES" },
                    { "name": "color", "data_type": "text", "is_nullable": false, "column_default": null }
                ]
            }]
        }"#;

        let snapshot: SchemaSnapshot = serde_json::from_str(raw).expect("parse snapshot");
        let tags = snapshot.table("tags").expect("tags");
        let id = tags.column("id").expect("id");
        assert!(!id.is_nullable);
        assert!(id.has_default);
        let color = tags.column("color").expect("color");
        assert!(!color.has_default);
        assert!(snapshot.enums.is_empty());
        assert!(snapshot.schema.is_none());
    }

    #[test]
    fn snapshot_rejects_unrecognised_flag_text() {
        let raw = r#"{ "tables": [{ "name": "t", "columns": [
            { "name": "c", "data_type": "text", "is_nullable": "maybe" }
        ] }] }"#;

        let err = serde_json::from_str::<SchemaSnapshot>(raw).expect_err("bad flag");
        assert!(err.to_string().contains("got 'maybe'"), "{err}");
        assert!(!err.to_string().contains("MAYBE"), "{err}");
    }
}
