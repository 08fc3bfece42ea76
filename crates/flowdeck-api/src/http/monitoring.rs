//! Monitoring and health check handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is healthy.
    Healthy,
    /// Service is up but the store cannot be read.
    Degraded,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub requests_total: u64,
    pub active_workflows: usize,
    pub archived_workflows: usize,
    pub subscribers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health check handler.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, counts, message) = match state.engine.counts().await {
        Ok(counts) => (HealthStatus::Healthy, counts, None),
        Err(e) => (HealthStatus::Degraded, Default::default(), Some(e.to_string())),
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime().as_secs(),
        requests_total: state.request_count(),
        active_workflows: counts.active,
        archived_workflows: counts.history,
        subscribers: state.engine.broadcaster().subscriber_count(),
        message,
    })
}

/// Liveness probe.
pub async fn liveness_probe() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
#[path = "monitoring_tests.rs"]
mod tests;
