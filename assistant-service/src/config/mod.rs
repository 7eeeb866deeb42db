use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use service_core::observability::LogFormat;
use std::collections::HashMap;

use crate::services::backends::ollama::normalize_host;
use crate::services::backends::GenerationParams;

/// Environment variables read at startup.
const ENV_KEYS: &[&str] = &[
    "BACKEND",
    "OLLAMA_HOST",
    "MODEL_NAME",
    "MODEL_PATH",
    "MAX_TOKENS",
    "TEMPERATURE",
    "CORS_ORIGINS",
    "LOG_LEVEL",
    "LOG_FORMAT",
    "HOST",
    "PORT",
    "ENVIRONMENT",
    "WORKERS",
    "REQUEST_TIMEOUT_SECS",
];

/// Accepted `LOG_LEVEL` values.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Which text-generation backend serves `/ask`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Remote Ollama daemon reached over HTTP.
    #[default]
    Ollama,
    /// GGUF checkpoint loaded in-process.
    Local,
}

/// Deployment mode. Development adds debug details to failed `/ask` bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[serde(alias = "prod")]
    Production,
    #[serde(alias = "dev")]
    Development,
}

/// Allowed cross-origin callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    /// Parse `*` or a comma-separated origin list.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return CorsOrigins::Any;
        }

        CorsOrigins::List(
            raw.split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Request worker threads sharing the listening socket.
    pub workers: usize,
    /// Server-level cap on a single request, generation included.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub kind: BackendKind,
    pub ollama_host: String,
    pub model_name: String,
    /// GGUF file for the local backend.
    pub model_path: String,
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub generation: GenerationParams,
    pub cors_origins: CorsOrigins,
    pub log_level: String,
    pub log_format: LogFormat,
    pub environment: Environment,
}

/// Flat view of the environment, before defaults are resolved into
/// [`AssistantConfig`].
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    backend: BackendKind,
    #[serde(default = "default_ollama_host")]
    ollama_host: String,
    #[serde(default = "default_model_name")]
    model_name: String,
    #[serde(default)]
    model_path: Option<String>,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_temperature")]
    temperature: f32,
    #[serde(default = "default_cors_origins")]
    cors_origins: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    log_format: LogFormat,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    environment: Environment,
    #[serde(default)]
    workers: Option<usize>,
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_model_name() -> String {
    "smollm:1.7b".to_string()
}

fn default_max_tokens() -> u32 {
    200
}

fn default_temperature() -> f32 {
    0.7
}

fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Two workers per core plus one, the usual sizing for blocking request workers.
fn default_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus * 2 + 1
}

impl AssistantConfig {
    /// Load from the process environment (and `.env`, if present).
    pub fn load() -> Result<Self, AppError> {
        Self::from_vars(core_config::collect_env(ENV_KEYS))
    }

    /// Load from an explicit variable map, keyed by environment variable name.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, AppError> {
        let raw: RawSettings = core_config::load_settings(vars)?;

        if raw.workers == Some(0) {
            return Err(config_error("WORKERS must be at least 1"));
        }
        if raw.request_timeout_secs == 0 {
            return Err(config_error("REQUEST_TIMEOUT_SECS must be at least 1"));
        }
        if !raw.temperature.is_finite() || raw.temperature < 0.0 {
            return Err(config_error("TEMPERATURE must be a non-negative number"));
        }
        let log_level = raw.log_level.trim().to_lowercase();
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(config_error(&format!(
                "LOG_LEVEL must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                raw.log_level
            )));
        }

        let model_path = raw.model_path.unwrap_or_else(|| raw.model_name.clone());

        Ok(AssistantConfig {
            server: ServerSettings {
                host: raw.host,
                port: raw.port,
                workers: raw.workers.unwrap_or_else(default_workers),
                request_timeout_secs: raw.request_timeout_secs,
            },
            backend: BackendSettings {
                kind: raw.backend,
                ollama_host: normalize_host(&raw.ollama_host),
                model_name: raw.model_name,
                model_path,
            },
            generation: GenerationParams {
                max_tokens: raw.max_tokens,
                temperature: raw.temperature,
            },
            cors_origins: CorsOrigins::parse(&raw.cors_origins),
            log_level,
            log_format: raw.log_format,
            environment: raw.environment,
        })
    }

    /// Address reported by `/health` for the configured backend.
    pub fn backend_host(&self) -> String {
        match self.backend.kind {
            BackendKind::Ollama => self.backend.ollama_host.clone(),
            BackendKind::Local => format!("local:{}", self.backend.model_path),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn config_error(message: &str) -> AppError {
    AppError::ConfigError(anyhow::anyhow!("{}", message))
}
