use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Request timed out: {0}")]
    Timeout(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details) = match self {
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), None),
            AppError::InternalError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(format!("{:#}", err)),
            ),
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
            AppError::Timeout(err) => (
                StatusCode::GATEWAY_TIMEOUT,
                "Request timed out".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_renders_message_without_details() {
        let response = AppError::NotFound(anyhow::anyhow!("Not found")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Not found");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn config_error_keeps_cause_in_details() {
        let err = AppError::from(config::ConfigError::Message("bad max_tokens".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Configuration error");
        assert!(body["details"].as_str().unwrap().contains("bad max_tokens"));
    }

    #[tokio::test]
    async fn timeout_is_a_gateway_timeout() {
        let response = AppError::Timeout(anyhow::anyhow!("no reply within 120s")).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Request timed out");
        assert_eq!(body["details"], "no reply within 120s");
    }

    #[test]
    fn io_errors_become_internal_errors() {
        let err = AppError::from(std::io::Error::other("address in use"));
        assert!(matches!(err, AppError::InternalError(_)));
        assert!(err.to_string().contains("address in use"));
    }
}
