//! Core type definitions for Formwork.
//!
//! This crate defines the loosely-typed data that flows between the
//! declaration-driven components:
//! - [`Value`]: the closed tagged variant used for contexts, records and
//!   expression results
//! - [`Context`] / [`Record`]: string-keyed maps of values
//! - [`OperationId`]: identifier for queued storage operations (UUID v7)

mod ids;
mod value;

pub use ids::OperationId;
pub use value::{Context, Record, Value};
