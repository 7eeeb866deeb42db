use axum::{extract::State, Json};
use std::collections::BTreeMap;

use crate::models::ServiceInfo;
use crate::startup::AppState;

pub const SERVICE_NAME: &str = "Interview Assistant API";

/// Describe the service and its routes. Never touches the backend.
pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    let base_url = format!("http://localhost:{}", state.config.server.port);

    let endpoints = BTreeMap::from([
        ("GET /", "Service information"),
        ("GET /health", "Backend connectivity check"),
        ("POST /ask", "Answer an interview question: {\"text\": \"...\"}"),
    ]);

    let example_usage = BTreeMap::from([
        ("health", format!("curl {}/health", base_url)),
        (
            "ask",
            format!(
                "curl -X POST {}/ask -H 'Content-Type: application/json' -d '{{\"text\": \"What is a deadlock?\"}}'",
                base_url
            ),
        ),
    ]);

    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        model: state.config.backend.model_name.clone(),
        endpoints,
        example_usage,
    })
}
