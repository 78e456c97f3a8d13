//! Health check route.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::api::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness probe; touches no storage.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
