//! Bodies for the service info and health endpoints.

use serde::Serialize;
use std::collections::BTreeMap;

/// Static description served at `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub model: String,
    /// Route (`METHOD /path`) to a one-line description.
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub example_usage: BTreeMap<&'static str, String>,
}

/// `GET /health` body when the backend probe succeeds.
#[derive(Debug, Clone, Serialize)]
pub struct Healthy {
    pub status: &'static str,
    pub model: String,
    pub backend_host: String,
    /// Number of models the backend reports.
    pub available_models: usize,
}

/// `GET /health` body when the backend probe fails.
#[derive(Debug, Clone, Serialize)]
pub struct Unhealthy {
    pub status: &'static str,
    pub error: String,
    pub backend_host: String,
}
