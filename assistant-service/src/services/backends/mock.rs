//! Mock backend for testing.

use super::{BackendError, GenerationParams, TextBackend};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted backend that records how it was called.
pub struct MockBackend {
    reply: Result<String, BackendError>,
    models: Result<Vec<String>, BackendError>,
    delay: Option<Duration>,
    generate_calls: AtomicUsize,
    list_calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
    last_params: Mutex<Option<GenerationParams>>,
}

impl MockBackend {
    /// Backend whose every generation returns `answer`.
    pub fn answering(answer: impl Into<String>) -> Self {
        Self::with_reply(Ok(answer.into()))
    }

    /// Backend whose every generation fails with `error`.
    pub fn failing(error: BackendError) -> Self {
        Self::with_reply(Err(error))
    }

    fn with_reply(reply: Result<String, BackendError>) -> Self {
        Self {
            reply,
            models: Ok(vec!["mock-model".to_string()]),
            delay: None,
            generate_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
            last_params: Mutex::new(None),
        }
    }

    /// Make the model listing (health probe) fail with `error`.
    pub fn unhealthy(mut self, error: BackendError) -> Self {
        self.models = Err(error);
        self
    }

    /// Replace the model listing.
    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = Ok(models.iter().map(|m| m.to_string()).collect());
        self
    }

    /// Hold every generation for `delay` before replying.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }

    pub fn last_params(&self) -> Option<GenerationParams> {
        self.last_params.lock().ok().and_then(|p| *p)
    }
}

#[async_trait]
impl TextBackend for MockBackend {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        if let Ok(mut last) = self.last_params.lock() {
            *last = Some(*params);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.reply.clone()
    }

    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.models.clone()
    }
}
