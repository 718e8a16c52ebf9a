use formwork_types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Describes one entity type: its fields, in declaration order, and its
/// optional single-column primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    pub fields: Vec<SchemaField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
}

impl EntitySchema {
    /// Name of the backing table (lower-cased entity name).
    pub fn table_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Looks up a declared field by exact name.
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// The primary key field, when one is declared.
    pub fn primary_key_field(&self) -> Option<&SchemaField> {
        self.primary_key.as_deref().and_then(|pk| self.field(pk))
    }

    /// Declared field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// A single declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Validation keywords (`maxLength`, `minimum`, `pattern`, ...) carried
    /// through for the presentation layer. Not interpreted here.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<String, Value>,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            default: None,
            constraints: BTreeMap::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// The canonical field types. Declaration aliases normalize to these at
/// load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    DateTime,
}

impl FieldType {
    /// Normalizes a declared `type` (and optional `format`) to a canonical
    /// type. Matching is case-insensitive.
    ///
    /// A `string` carrying `format: date-time` or `format: date` is a
    /// date-time field.
    pub fn normalize(declared: &str, format: Option<&str>) -> Option<Self> {
        let declared = declared.trim().to_ascii_lowercase();
        let base = match declared.as_str() {
            "string" | "text" => FieldType::String,
            "integer" | "int" => FieldType::Integer,
            "number" | "decimal" | "float" | "double" => FieldType::Number,
            "boolean" | "bool" => FieldType::Boolean,
            "date" | "datetime" | "date-time" => FieldType::DateTime,
            _ => return None,
        };
        let is_temporal_format = format
            .map(|f| matches!(f.trim().to_ascii_lowercase().as_str(), "date" | "date-time" | "datetime"))
            .unwrap_or(false);
        if base == FieldType::String && is_temporal_format {
            return Some(FieldType::DateTime);
        }
        Some(base)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::DateTime => "date-time",
        }
    }
}
