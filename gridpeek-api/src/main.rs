//! gridpeek server entry point.
//!
//! Reads the database settings from the environment, validates them before
//! serving any traffic, and starts the Axum HTTP server.

use std::net::SocketAddr;

use axum::Router;
use gridpeek_api::{create_api_router, ApiError, ApiResult, MssqlClient};
use gridpeek_core::DbSettings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = DbSettings::from_env()?;
    // Incomplete configuration fails here, before the listener binds.
    settings.connection_string()?;
    let db = MssqlClient::new(settings);

    let app: Router = create_api_router(db);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting gridpeek server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("GRIDPEEK_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("GRIDPEEK_PORT").ok())
        .unwrap_or_else(|| "8000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
