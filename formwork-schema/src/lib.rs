//! Entity schemas for Formwork.
//!
//! Parses object-schema declaration documents into normalized field
//! metadata:
//! - [`EntitySchema`]: one logical record type and its storage shape
//! - [`SchemaField`] / [`FieldType`]: a field with its canonical type
//! - [`SchemaRegistry`]: the loaded set, looked up by entity name
//!
//! A load either yields a complete registry or fails; there is no partially
//! usable result.

mod error;
mod registry;
mod schema;

pub use error::{SchemaError, SchemaResult};
pub use registry::SchemaRegistry;
pub use schema::{EntitySchema, FieldType, SchemaField};
