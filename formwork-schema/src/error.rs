//! Error types for schema loading and lookup.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while loading or resolving schemas.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The declaration document could not be parsed.
    #[error("invalid schema declaration: {0}")]
    InvalidDeclaration(String),

    /// No schema is registered under this entity name.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// Declared primary key does not name a declared field.
    #[error("entity '{entity}' declares primary key '{field}' which is not a declared field")]
    InvalidPrimaryKey { entity: String, field: String },

    /// Property type is not one of the known types or aliases.
    #[error("entity '{entity}' field '{field}' has unsupported type '{field_type}'")]
    UnsupportedFieldType {
        entity: String,
        field: String,
        field_type: String,
    },

    /// `required` lists a name with no matching property.
    #[error("entity '{entity}' lists unknown required field '{field}'")]
    UnknownRequiredField { entity: String, field: String },

    /// Two entity names map to the same storage table.
    #[error("duplicate entity name: {0}")]
    DuplicateEntity(String),
}

impl From<serde_json::Error> for SchemaError {
    fn from(e: serde_json::Error) -> Self {
        SchemaError::InvalidDeclaration(e.to_string())
    }
}
