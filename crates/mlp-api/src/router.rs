use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;

use crate::{error::ApiError, response::ApiResponse, state::ApiState, v1};

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .nest("/v1", v1::routes())
        .fallback(handler_404)
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
}

async fn health() -> ApiResponse<HealthStatus> {
    ApiResponse::ok("Service is alive", HealthStatus { status: "ok" })
}

/// Ready once the database answers.
async fn ready(State(state): State<ApiState>) -> Result<ApiResponse<HealthStatus>, ApiError> {
    mlp_db::ping(&state.pool).await.map_err(|e| {
        tracing::warn!(error = %e, "readiness check failed");
        ApiError::ServiceUnavailable("Database unavailable".to_string())
    })?;

    Ok(ApiResponse::ok("Service is ready", HealthStatus { status: "ready" }))
}

async fn handler_404() -> impl IntoResponse {
    ApiError::NotFound("The requested resource was not found".to_string())
}

