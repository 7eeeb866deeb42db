pub mod backends;
pub mod prompt;

pub use backends::{init_backend, BackendError, GenerationParams, TextBackend};
