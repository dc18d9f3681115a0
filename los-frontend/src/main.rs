use los_frontend::config::FrontendConfig;
use los_frontend::startup::run;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = FrontendConfig::load().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("los-frontend", &config.log_level, config.otlp_endpoint.as_deref());

    run(config).await
}
