//! HTTP route handlers.
//!
//! Three groups: the browse page (HTML), table mutations (form posts that
//! redirect back to the page), and the health check. Every request is
//! reconstructed from its query parameters and form fields; no session
//! state exists anywhere.

pub mod browse;
pub mod health;
pub mod table;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::db::MssqlClient;

// Re-export route creation functions for convenience
pub use browse::create_router as browse_router;
pub use health::create_router as health_router;
pub use table::create_router as table_router;

/// Assemble the full application router.
pub fn create_api_router(db: MssqlClient) -> Router {
    Router::new()
        .merge(browse_router(db.clone()))
        .merge(table_router(db.clone()))
        .merge(health_router(db))
        .layer(TraceLayer::new_for_http())
}
