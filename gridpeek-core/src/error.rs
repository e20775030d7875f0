//! Error types for gridpeek operations.

use thiserror::Error;

/// Configuration errors raised while assembling a connection string.
///
/// These are fatal: every database operation builds its connection from
/// the same settings, so a bad configuration fails before any network
/// activity takes place.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration value: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Schema resolution errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Table {table} not found")]
    TableNotFound { table: String },

    #[error("Table {table} has no primary key")]
    NoPrimaryKey { table: String },

    #[error("Composite primary key on {table} is not supported")]
    CompositeKey { table: String },
}

/// Validation errors for user-submitted identifiers.
///
/// Bad row values are a separate concern, see `coerce::CoerceError`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid identifier")]
    InvalidIdentifier,
}
