use assistant_service::config::AssistantConfig;
use assistant_service::startup::Application;
use service_core::observability::init_tracing;

const SERVICE_NAME: &str = "assistant-service";

fn main() -> anyhow::Result<()> {
    let config = AssistantConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(SERVICE_NAME, &config.log_level, config.log_format);

    // One runtime worker per request worker; these play the role of the
    // process manager's worker pool.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers)
        .thread_name("assistant-worker")
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

async fn run(config: AssistantConfig) -> anyhow::Result<()> {
    let app = Application::build(config)
        .await
        .map_err(|e| anyhow::anyhow!("Startup failed: {}", e))?;

    app.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    tracing::info!("Assistant service stopped");
    Ok(())
}
