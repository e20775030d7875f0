//! Error types for the HTTP layer.
//!
//! A single `ApiError` struct with an `ErrorCode` enum categorizes every
//! failure the request layer can surface, and `IntoResponse` maps it to a
//! JSON body with the matching status code. Mutation handlers usually
//! translate these into redirect-with-error instead; the JSON path covers
//! metadata lookups and anything genuinely unexpected.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use gridpeek_core::{ConfigError, SchemaError, TableRef, ValidationError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request contains invalid input data (empty identifier, no values)
    InvalidInput,

    /// A submitted field value failed coercion to its column type
    ValidationFailed,

    /// The (schema, table) pair does not name a known base table
    TableNotFound,

    /// The table has no single-column primary key to pin the operation to
    PrimaryKeyNotFound,

    /// Composite primary keys are not supported
    CompositeKeyUnsupported,

    /// Connection configuration is missing or invalid
    ConfigInvalid,

    /// Database operation failed (constraint, connectivity, syntax)
    DatabaseError,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput
            | ErrorCode::ValidationFailed
            | ErrorCode::PrimaryKeyNotFound
            | ErrorCode::CompositeKeyUnsupported => StatusCode::BAD_REQUEST,

            ErrorCode::TableNotFound => StatusCode::NOT_FOUND,

            ErrorCode::ConfigInvalid
            | ErrorCode::DatabaseError
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a ValidationFailed error naming the offending field.
    pub fn validation(field: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ValidationFailed,
            format!("Invalid value for {}: {}", field, reason),
        )
    }

    /// Create a TableNotFound error.
    pub fn table_not_found(table: &TableRef) -> Self {
        Self::new(
            ErrorCode::TableNotFound,
            format!("Table {} not found", table),
        )
    }

    /// Create a PrimaryKeyNotFound error.
    pub fn primary_key_not_found(table: &TableRef) -> Self {
        Self::new(
            ErrorCode::PrimaryKeyNotFound,
            format!("Table {} has no primary key", table),
        )
    }

    /// Create a ConfigInvalid error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Create a DatabaseError.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Create an InternalError.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM CORE AND DRIVER ERRORS
// ============================================================================

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::config(err.to_string())
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        let code = match err {
            SchemaError::TableNotFound { .. } => ErrorCode::TableNotFound,
            SchemaError::NoPrimaryKey { .. } => ErrorCode::PrimaryKeyNotFound,
            SchemaError::CompositeKey { .. } => ErrorCode::CompositeKeyUnsupported,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::invalid_input(err.to_string())
    }
}

/// The driver message text is kept verbatim: mutation failures surface it
/// to the browsing page, matching what the server actually complained about.
impl From<tiberius::error::Error> for ApiError {
    fn from(err: tiberius::error::Error) -> Self {
        tracing::error!(error = %err, "database error");
        ApiError::database(err.to_string())
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
