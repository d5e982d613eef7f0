//! JSON Schema export of table shapes.

use agencydb_types::schema::table_schema_id;
use agencydb_types::{ColumnKind, Shape, TableDef};
use serde_json::{Map, Value, json};

use crate::error::{ContractError, ContractResult};

const DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Builds the JSON Schema (draft 2020-12) of `shape` for `table`.
pub fn json_schema(table: &TableDef, shape: Shape) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in table.contract(shape) {
        let mut property = column_schema(&field.column.kind);
        if field.nullable {
            admit_null(&mut property);
        }
        properties.insert(field.column.name.to_string(), Value::Object(property));
        if field.required {
            required.push(Value::from(field.column.name));
        }
    }

    json!({
        "$schema": DIALECT,
        "$id": table_schema_id(table.name, shape),
        "title": format!("{} {}", table.name, shape),
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn column_schema(kind: &ColumnKind) -> Map<String, Value> {
    let value = match kind {
        ColumnKind::Text => json!({ "type": "string" }),
        // Columns are 64-bit; larger JSON integers are out of range.
        ColumnKind::Integer => json!({
            "type": "integer",
            "minimum": i64::MIN,
            "maximum": i64::MAX,
        }),
        ColumnKind::Boolean => json!({ "type": "boolean" }),
        ColumnKind::Timestamp => json!({ "type": "string", "format": "date-time" }),
        ColumnKind::Json => json!({ "not": { "type": "null" } }),
        ColumnKind::Enum(def) => json!({
            "type": "string",
            "title": def.name,
            "enum": def.values,
        }),
    };
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn admit_null(property: &mut Map<String, Value>) {
    property.remove("not");
    if let Some(Value::String(ty)) = property.get("type").cloned() {
        property.insert("type".to_string(), json!([ty, "null"]));
    }
    if let Some(Value::Array(values)) = property.get_mut("enum") {
        values.push(Value::Null);
    }
}

/// A compiled JSON Schema for one table shape.
pub struct SchemaValidator {
    table: &'static str,
    shape: Shape,
    validator: jsonschema::Validator,
}

impl SchemaValidator {
    pub fn new(table: &TableDef, shape: Shape) -> ContractResult<Self> {
        let schema = json_schema(table, shape);
        let validator =
            jsonschema::validator_for(&schema).map_err(|e| ContractError::JsonSchema {
                table: table.name.to_string(),
                shape,
                message: e.to_string(),
            })?;
        Ok(Self {
            table: table.name,
            shape,
            validator,
        })
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn is_valid(&self, payload: &Value) -> bool {
        self.validator.is_valid(payload)
    }

    /// Error messages for `payload`; empty when it is valid.
    pub fn errors(&self, payload: &Value) -> Vec<String> {
        self.validator
            .iter_errors(payload)
            .map(|e| e.to_string())
            .collect()
    }
}
