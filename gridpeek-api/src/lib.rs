//! gridpeek API - HTTP layer over a live SQL Server database.
//!
//! This crate binds the pure logic in `gridpeek-core` to the outside
//! world: an Axum router serving one browsing page and three mutation
//! endpoints, and a per-request TDS client that introspects the catalog
//! views and executes the generated statements.

pub mod db;
pub mod error;
pub mod render;
pub mod routes;

// Re-export commonly used types
pub use db::{ConnectionInfo, MssqlClient};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
