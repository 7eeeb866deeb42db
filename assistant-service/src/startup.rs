//! Application startup and lifecycle management.
//!
//! Builds the shared state and router, binds the listener, and runs the
//! server until SIGINT/SIGTERM. Worker count is fixed by the runtime `main`
//! builds; the request timeout is applied here as a router layer.

use crate::config::{AssistantConfig, CorsOrigins};
use crate::handlers::{ask, health_check, not_found, request_failed, service_info};
use crate::services::{init_backend, TextBackend};
use axum::http::{header, HeaderName, HeaderValue, Method, Uri};
use axum::{
    error_handling::HandleErrorLayer,
    middleware::from_fn,
    routing::{get, post},
    BoxError, Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::{
    http_trace_layer, request_id_middleware, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AssistantConfig>,
    pub backend: Arc<dyn TextBackend>,
}

impl AppState {
    pub fn new(config: AssistantConfig, backend: Arc<dyn TextBackend>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
        }
    }
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::any(),
        CorsOrigins::List(list) => AllowOrigin::list(list.iter().filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", origin, e))
                .ok()
        })),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}

/// Build the HTTP router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/ask", post(ask))
        .fallback(not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |uri: Uri, error: BoxError| async move {
                    request_failed(&uri, error, request_timeout)
                }))
                .timeout(request_timeout),
        )
        // Add tracing layer
        .layer(http_trace_layer())
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add CORS layer
        .layer(cors)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Initialize the configured backend, then bind the listener.
    ///
    /// Fails if a local model cannot be loaded; an unreachable Ollama daemon
    /// only produces a warning.
    pub async fn build(config: AssistantConfig) -> Result<Self, AppError> {
        let backend = init_backend(&config).await.map_err(|e| {
            tracing::error!(kind = e.kind(), "Failed to initialize backend: {}", e);
            AppError::InternalError(e.into())
        })?;

        Self::with_backend(config, backend).await
    }

    /// Bind the listener around an already constructed backend
    /// (port 0 = random port for testing).
    pub async fn with_backend(
        config: AssistantConfig,
        backend: Arc<dyn TextBackend>,
    ) -> Result<Self, AppError> {
        let address = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            backend = ?config.backend.kind,
            model = %config.backend.model_name,
            workers = config.server.workers,
            "Assistant service listening"
        );

        Ok(Self {
            port,
            listener,
            state: AppState::new(config, backend),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}
