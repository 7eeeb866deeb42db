//! In-process llama.cpp backend.
//!
//! Loads a GGUF checkpoint once at startup. Each generation gets a fresh
//! context on a blocking thread; generations run one at a time so memory use
//! stays at a single context.

use super::{BackendError, GenerationParams, TextBackend};
use async_trait::async_trait;
use llama_cpp_2::{
    context::params::LlamaContextParams,
    llama_backend::LlamaBackend,
    llama_batch::LlamaBatch,
    model::params::LlamaModelParams,
    model::{AddBos, LlamaModel, Special},
    sampling::LlamaSampler,
};
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Context window allocated per generation (prompt + output).
const CONTEXT_TOKENS: u32 = 2048;

struct LoadedModel {
    backend: LlamaBackend,
    model: LlamaModel,
    generation: Mutex<()>,
}

/// Local llama.cpp text backend.
pub struct LocalBackend {
    inner: Arc<LoadedModel>,
    model_name: String,
}

impl LocalBackend {
    /// Load the checkpoint at `path`. Blocking; run off the async runtime.
    pub fn load(path: &Path, model_name: String) -> Result<Self, BackendError> {
        if !path.exists() {
            return Err(BackendError::NotConfigured(format!(
                "model file does not exist: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading local model");

        let backend = LlamaBackend::init()
            .map_err(|e| BackendError::NotConfigured(format!("llama.cpp init: {}", e)))?;
        let model = LlamaModel::load_from_file(&backend, path, &LlamaModelParams::default())
            .map_err(|e| BackendError::NotConfigured(format!("failed to load model: {}", e)))?;

        tracing::info!(model = %model_name, "Local model loaded");

        Ok(Self {
            inner: Arc::new(LoadedModel {
                backend,
                model,
                generation: Mutex::new(()),
            }),
            model_name,
        })
    }
}

impl LoadedModel {
    fn generate_blocking(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        let _turn = self
            .generation
            .lock()
            .map_err(|_| BackendError::ModelFault("generation lock poisoned".to_string()))?;

        let tokens = self
            .model
            .str_to_token(prompt, AddBos::Always)
            .map_err(|e| BackendError::DecodeFault(format!("tokenize prompt: {}", e)))?;

        if tokens.is_empty() {
            return Err(BackendError::DecodeFault(
                "prompt produced no tokens".to_string(),
            ));
        }
        if tokens.len() >= CONTEXT_TOKENS as usize {
            return Err(BackendError::ModelFault(format!(
                "prompt of {} tokens exceeds the {} token context",
                tokens.len(),
                CONTEXT_TOKENS
            )));
        }

        let context_params = LlamaContextParams::default().with_n_ctx(NonZeroU32::new(CONTEXT_TOKENS));
        let mut context = self
            .model
            .new_context(&self.backend, context_params)
            .map_err(|e| BackendError::ModelFault(format!("create context: {}", e)))?;

        let mut batch = LlamaBatch::new(CONTEXT_TOKENS as usize, 1);
        let last_index = tokens.len() - 1;
        for (i, &token) in tokens.iter().enumerate() {
            batch
                .add(token, i as i32, &[0], i == last_index)
                .map_err(|e| BackendError::ModelFault(format!("fill prompt batch: {}", e)))?;
        }

        context
            .decode(&mut batch)
            .map_err(|e| BackendError::ModelFault(format!("decode prompt: {}", e)))?;

        let mut sampler = if params.temperature <= 0.0 {
            LlamaSampler::greedy()
        } else {
            LlamaSampler::chain_simple([
                LlamaSampler::temp(params.temperature),
                LlamaSampler::top_k(40),
                LlamaSampler::top_p(0.95, 1),
                LlamaSampler::dist(sampling_seed()),
            ])
        };

        let budget = (params.max_tokens as usize).min(CONTEXT_TOKENS as usize - tokens.len());
        let mut generated = Vec::with_capacity(budget);
        let mut pos = tokens.len() as i32;

        while generated.len() < budget {
            let token = sampler.sample(&context, batch.n_tokens() - 1);
            sampler.accept(token);

            if self.model.is_eog_token(token) {
                break;
            }
            generated.push(token);

            batch.clear();
            batch
                .add(token, pos, &[0], true)
                .map_err(|e| BackendError::ModelFault(format!("fill batch: {}", e)))?;
            pos += 1;

            context
                .decode(&mut batch)
                .map_err(|e| BackendError::ModelFault(format!("decode token: {}", e)))?;
        }

        tracing::debug!(tokens = generated.len(), "Local generation finished");

        self.model
            .tokens_to_str(&generated, Special::Plaintext)
            .map_err(|e| BackendError::DecodeFault(format!("detokenize: {}", e)))
    }
}

fn sampling_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(1234)
}

#[async_trait]
impl TextBackend for LocalBackend {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        let model = Arc::clone(&self.inner);
        let prompt = prompt.to_string();
        let params = *params;

        tokio::task::spawn_blocking(move || model.generate_blocking(&prompt, &params))
            .await
            .map_err(|e| BackendError::ModelFault(format!("generation task failed: {}", e)))?
    }

    /// The handle exists only once the model loaded, so readiness is implied.
    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        Ok(vec![self.model_name.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_checkpoint_fails_to_load() {
        let result = LocalBackend::load(
            Path::new("/nonexistent/model.gguf"),
            "smollm-1.7b".to_string(),
        );
        assert!(matches!(result, Err(BackendError::NotConfigured(_))));
    }
}
