//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite (constraint violation, I/O failure, ...).
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Entity name has no loaded schema.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// A record, filter or ordering named a field the schema does not declare.
    #[error("entity '{entity}' has no field '{field}'")]
    UnknownField { entity: String, field: String },

    /// A value cannot be stored in the column it was given for.
    #[error("invalid value for '{entity}.{field}': {reason}")]
    InvalidValue {
        entity: String,
        field: String,
        reason: String,
    },

    /// An update-by-key save targeted a row that does not exist.
    #[error("no '{entity}' record with id {id}")]
    RecordNotFound { entity: String, id: String },

    /// Query options could not be interpreted.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("storage connection lock poisoned")]
    LockPoisoned,
}
