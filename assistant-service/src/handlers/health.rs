use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::models::{Healthy, Unhealthy};
use crate::startup::AppState;

/// Probe the backend by listing its models.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let backend_host = state.config.backend_host();

    match state.backend.list_models().await {
        Ok(models) => (
            StatusCode::OK,
            Json(Healthy {
                status: "healthy",
                model: state.config.backend.model_name.clone(),
                backend_host,
                available_models: models.len(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, kind = e.kind(), "Backend health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Unhealthy {
                    status: "unhealthy",
                    error: e.to_string(),
                    backend_host,
                }),
            )
                .into_response()
        }
    }
}
