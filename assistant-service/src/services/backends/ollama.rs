//! Ollama backend.
//!
//! Talks to an Ollama daemon over its HTTP API: `POST /api/generate` for
//! completions (non-streaming) and `GET /api/tags` for the model listing.

use super::{BackendError, GenerationParams, TextBackend};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long to wait for the TCP connection before calling the daemon unreachable.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ollama text backend.
pub struct OllamaBackend {
    client: Client,
    host: String,
    model: String,
}

impl OllamaBackend {
    /// Bind a client to `host`. Accepts `host:port` without a scheme, as
    /// `OLLAMA_HOST` commonly does.
    pub fn new(host: &str, model: &str) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BackendError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: normalize_host(host),
            model: model.to_string(),
        })
    }

    /// Base URL requests are sent to.
    pub fn host(&self) -> &str {
        &self.host
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.host, path)
    }
}

/// Bare `host:port` values get `http://`; a trailing slash is dropped.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

/// Turn a non-2xx reply into a model fault carrying Ollama's own message.
async fn api_error(response: reqwest::Response) -> BackendError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let detail = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    BackendError::ModelFault(format!("Ollama error {}: {}", status, detail.trim()))
}

#[async_trait]
impl TextBackend for OllamaBackend {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens,
            },
        };

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            max_tokens = params.max_tokens,
            "Sending generate request to Ollama"
        );

        let response = self
            .client
            .post(self.api_url("generate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::DecodeFault(e.to_string()))?;

        let generated: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::DecodeFault(format!("generate response: {}", e)))?;

        Ok(generated.response)
    }

    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(self.api_url("tags"))
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| BackendError::DecodeFault(format!("tags response: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

// ============================================================================
// Ollama API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}
