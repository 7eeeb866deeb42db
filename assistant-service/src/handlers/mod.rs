//! HTTP handlers for the assistant service.

pub mod ask;
pub mod health;
pub mod info;

pub use ask::ask;
pub use health::health_check;
pub use info::service_info;

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    BoxError, Json,
};
use service_core::error::AppError;
use std::time::Duration;
use tower::timeout::error::Elapsed;

use crate::models::AskResponse;

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Not found"))
}

/// Render a request the server layers gave up on.
///
/// A timed-out `/ask` still answers with an `answer` key; other routes get
/// the shared error body.
pub fn request_failed(uri: &Uri, error: BoxError, limit: Duration) -> Response {
    if !error.is::<Elapsed>() {
        tracing::error!(path = %uri.path(), error = %error, "Request failed in middleware");
        return AppError::InternalError(anyhow::anyhow!("{}", error)).into_response();
    }

    tracing::error!(path = %uri.path(), limit_secs = limit.as_secs(), "Request timed out");
    if uri.path() == "/ask" {
        let answer = format!(
            "Error generating answer: request timed out after {}s",
            limit.as_secs()
        );
        return (StatusCode::GATEWAY_TIMEOUT, Json(AskResponse::answer(answer))).into_response();
    }

    AppError::Timeout(anyhow::anyhow!("no reply within {}s", limit.as_secs())).into_response()
}
