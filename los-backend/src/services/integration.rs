//! Client for the integration service's liveness contract: `GET {base}/int/ping`.

use crate::config::IntegrationConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use service_core::error::AppError;
use service_core::observability::TracedClientExt;
use std::time::Duration;

pub const PING_PATH: &str = "/int/ping";

#[async_trait]
pub trait IntegrationService: Send + Sync {
    /// Returns the upstream body unmodified. `request_id` is forwarded as
    /// `x-request-id` for correlation.
    async fn ping(&self, request_id: Option<&str>) -> Result<Value, AppError>;
}

#[derive(Clone)]
pub struct IntegrationClient {
    client: Client,
    base_url: Option<String>,
}

impl IntegrationClient {
    pub fn new(config: &IntegrationConfig, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
        })
    }
}

/// JSON bodies are returned as parsed; anything else is echoed as a string.
fn decode_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

#[async_trait]
impl IntegrationService for IntegrationClient {
    async fn ping(&self, request_id: Option<&str>) -> Result<Value, AppError> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "INTEGRATION_BASE_URL is required but not set"
            ))
        })?;
        let url = format!("{}{}", base_url, PING_PATH);

        let response = self
            .client
            .traced_get(&url)
            .send(request_id)
            .await
            .map_err(|e| {
                tracing::error!("Failed to send GET request to {}: {}", url, e);
                if e.is_timeout() {
                    AppError::GatewayTimeout(format!("GET {} timed out", url))
                } else {
                    AppError::BadGateway(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "Integration service returned an error status");
            return Err(AppError::BadGateway(format!(
                "integration service responded with {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read integration response body: {}", e);
            AppError::BadGateway(e.to_string())
        })?;

        Ok(decode_body(&body))
    }
}
