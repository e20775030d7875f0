//! gridpeek core - connection, schema, coercion and SQL-text logic.
//!
//! Everything in this crate is pure: no sockets, no driver types, no
//! process-global state. The HTTP layer (`gridpeek-api`) feeds catalog
//! metadata and form input through these functions and binds the results
//! to the database client.

pub mod coerce;
pub mod config;
pub mod error;
pub mod schema;
pub mod sql;

// Re-export commonly used types
pub use coerce::{coerce_value, CoerceError, SqlValue};
pub use config::{AuthMode, DbSettings, CONNECT_TIMEOUT, DEFAULT_DRIVER};
pub use error::{ConfigError, SchemaError, ValidationError};
pub use schema::{resolve_primary_key, ColumnMetadata, TableRef};
pub use sql::{quote_ident, DEFAULT_ROW_LIMIT};
