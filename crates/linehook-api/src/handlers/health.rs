//! Health check handler.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Service version information
    pub version: String,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
}

/// Overall health status enumeration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is accepting webhooks
    Healthy,
}

/// Liveness endpoint. The service holds no external connections, so a
/// response means it is healthy.
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Performing health check");

    Json(HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}
