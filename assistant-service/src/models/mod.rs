//! Wire models for the assistant service.

pub mod ask;
pub mod service;

pub use ask::{AskDebug, AskRequest, AskResponse};
pub use service::{Healthy, ServiceInfo, Unhealthy};
