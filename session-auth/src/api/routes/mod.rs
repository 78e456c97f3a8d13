//! API route modules.

pub mod auth;
pub mod health;

use axum::Router;

use crate::api::error::ApiError;
use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .merge(health::router())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}
