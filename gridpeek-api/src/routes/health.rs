//! Health check endpoint.
//!
//! `GET /health` runs a trivial round-trip query; the result maps directly
//! to a binary status. No authentication, no details beyond the failure
//! message.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::MssqlClient;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// GET /health - database round-trip check.
pub async fn health(State(db): State<MssqlClient>) -> impl IntoResponse {
    match db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                message: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "error".to_string(),
                    message: Some(e.message),
                }),
            )
        }
    }
}

pub fn create_router(db: MssqlClient) -> Router {
    Router::new().route("/health", get(health)).with_state(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            message: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, "{\"status\":\"ok\"}");
    }

    #[test]
    fn test_health_failure_carries_message() {
        let response = HealthResponse {
            status: "error".to_string(),
            message: Some("Connection refused".to_string()),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("Connection refused"));
    }
}
