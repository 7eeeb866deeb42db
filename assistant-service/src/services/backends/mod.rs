//! Text-generation backends.
//!
//! Handlers only see [`TextBackend`]; the concrete backend (remote Ollama
//! daemon or an in-process llama.cpp model) is chosen once at startup by
//! [`init_backend`].

#[cfg(feature = "local-model")]
pub mod local;
pub mod mock;
pub mod ollama;

use crate::config::{AssistantConfig, BackendKind};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Error type for backend operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached at all.
    #[error("model backend unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with an error of its own (unknown model, quota, ...).
    #[error("{0}")]
    ModelFault(String),

    /// The backend answered but the payload could not be decoded.
    #[error("invalid backend response: {0}")]
    DecodeFault(String),

    /// The backend cannot be constructed in this build or configuration.
    #[error("backend not available: {0}")]
    NotConfigured(String),
}

impl BackendError {
    /// Stable tag used in logs and debug responses.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Unreachable(_) => "unreachable",
            BackendError::ModelFault(_) => "model_fault",
            BackendError::DecodeFault(_) => "decode_fault",
            BackendError::NotConfigured(_) => "not_configured",
        }
    }
}

/// Sampling parameters passed with every generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature; `0.0` means greedy decoding.
    pub temperature: f32,
}

/// A text-generation capability shared read-only by all request handlers.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str, params: &GenerationParams)
        -> Result<String, BackendError>;

    /// List the models the backend can serve. Doubles as the health probe.
    async fn list_models(&self) -> Result<Vec<String>, BackendError>;
}

/// Create the process-wide backend handle.
///
/// A local model must load before the server starts, so any failure is
/// returned. For Ollama the model listing is only a probe: failure is logged
/// and the handle is returned anyway.
pub async fn init_backend(config: &AssistantConfig) -> Result<Arc<dyn TextBackend>, BackendError> {
    match config.backend.kind {
        BackendKind::Ollama => {
            let backend = ollama::OllamaBackend::new(
                &config.backend.ollama_host,
                &config.backend.model_name,
            )?;

            match backend.list_models().await {
                Ok(models) => tracing::info!(
                    host = %backend.host(),
                    model = %config.backend.model_name,
                    available_models = models.len(),
                    "Connected to Ollama"
                ),
                Err(e) => tracing::warn!(
                    host = %backend.host(),
                    error = %e,
                    "Ollama probe failed; serving anyway"
                ),
            }

            Ok(Arc::new(backend))
        }
        BackendKind::Local => load_local(config).await,
    }
}

#[cfg(feature = "local-model")]
async fn load_local(config: &AssistantConfig) -> Result<Arc<dyn TextBackend>, BackendError> {
    let path = std::path::PathBuf::from(&config.backend.model_path);
    let name = config.backend.model_name.clone();

    let backend = tokio::task::spawn_blocking(move || local::LocalBackend::load(&path, name))
        .await
        .map_err(|e| BackendError::NotConfigured(format!("model loader panicked: {}", e)))??;

    Ok(Arc::new(backend))
}

#[cfg(not(feature = "local-model"))]
async fn load_local(_config: &AssistantConfig) -> Result<Arc<dyn TextBackend>, BackendError> {
    Err(BackendError::NotConfigured(
        "BACKEND=local requires building with the `local-model` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable_tags() {
        assert_eq!(BackendError::Unreachable("x".into()).kind(), "unreachable");
        assert_eq!(BackendError::ModelFault("x".into()).kind(), "model_fault");
        assert_eq!(BackendError::DecodeFault("x".into()).kind(), "decode_fault");
        assert_eq!(
            BackendError::NotConfigured("x".into()).kind(),
            "not_configured"
        );
    }

    #[test]
    fn model_fault_displays_backend_detail_verbatim() {
        let err = BackendError::ModelFault("model 'llama9' not found".into());
        assert_eq!(err.to_string(), "model 'llama9' not found");
    }

    #[cfg(not(feature = "local-model"))]
    #[tokio::test]
    async fn local_backend_without_feature_is_fatal() {
        let vars = std::collections::HashMap::from([("BACKEND".to_string(), "local".to_string())]);
        let config = AssistantConfig::from_vars(vars).unwrap();

        let result = init_backend(&config).await;
        assert!(matches!(result, Err(BackendError::NotConfigured(_))));
    }
}
