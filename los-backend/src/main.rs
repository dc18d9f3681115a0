use los_backend::config::BackendConfig;
use los_backend::services::init_metrics;
use los_backend::startup::Application;
use service_core::error::AppError;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = BackendConfig::load()?;

    init_tracing(
        "los-backend",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    init_metrics();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.common.port,
        "Starting LOS backend"
    );

    // Any dependency that fails to initialise ends the process with a non-zero status.
    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Fatal: {}", e);
        e
    })?;

    app.run_until_stopped().await?;
    Ok(())
}
