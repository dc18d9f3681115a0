use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use service_core::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct FrontendConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base the browser prefixes to `/health` and `/integration/ping`.
    /// This server does not serve or proxy `/api` itself: the default assumes a
    /// reverse proxy routes `/api` on this origin to the backend. Without one,
    /// set `BACKEND_URL` to the backend's absolute URL, e.g.
    /// `http://localhost:3000/api`.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_backend_url() -> String {
    "/api".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            backend_url: default_backend_url(),
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

impl FrontendConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_builder(
            Cfg::builder()
                .add_source(File::with_name("configuration").required(false))
                .add_source(Environment::default()),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AppError> {
        let mut config: Self = builder.build()?.try_deserialize()?;
        config.backend_url = config.backend_url.trim_end_matches('/').to_string();
        if config.backend_url.is_empty() {
            config.backend_url = default_backend_url();
        }
        config.otlp_endpoint = config
            .otlp_endpoint
            .filter(|endpoint| !endpoint.trim().is_empty());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let config = FrontendConfig::from_builder(Cfg::builder()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend_url, "/api");
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn backend_url_loses_trailing_slash() {
        let config = FrontendConfig::from_builder(
            Cfg::builder()
                .set_override("backend_url", "http://localhost:3000/api/")
                .unwrap()
                .set_override("port", "9090")
                .unwrap(),
        )
        .unwrap();
        assert_eq!(config.backend_url, "http://localhost:3000/api");
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn bare_slash_falls_back_to_default() {
        let config = FrontendConfig::from_builder(
            Cfg::builder().set_override("backend_url", "/").unwrap(),
        )
        .unwrap();
        assert_eq!(config.backend_url, "/api");
    }
}
