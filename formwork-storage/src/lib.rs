//! SQLite storage engine for Formwork.
//!
//! Tables are created at run time from [`EntitySchema`]s and records are
//! read and written generically:
//!
//! - One table per entity, named after the lower-cased entity name
//! - One column per declared field, typed through a fixed mapping
//! - Every literal travels as a bound parameter; identifiers come only from
//!   schema metadata
//!
//! All access goes through a single connection guarded by a mutex, so the
//! engine never has more than one writer.
//!
//! [`EntitySchema`]: formwork_schema::EntitySchema

mod convert;
mod ddl;
mod engine;
mod error;
mod query;

pub use ddl::create_table_sql;
pub use engine::StorageEngine;
pub use error::{StorageError, StorageResult};
pub use query::{Direction, Filter, Operator, OrderBy, QueryOptions};
