use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "los";
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_MINIO_PORT: u16 = 9000;
pub const DEFAULT_BUCKET_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub redis: RedisConfig,
    pub minio: MinioConfig,
    pub integration: IntegrationConfig,
    /// Upper bound for any single call a handler makes to a dependency.
    pub downstream_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: Option<String>,
    pub database: String,
    pub server_selection_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: Option<String>,
    pub port: u16,
    pub password: Option<Secret<String>>,
}

#[derive(Debug, Clone)]
pub struct MinioConfig {
    pub endpoint: Option<String>,
    pub port: u16,
    pub use_ssl: bool,
    pub access_key: Option<String>,
    pub secret_key: Option<Secret<String>>,
    pub bucket: Option<String>,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub base_url: Option<String>,
}

impl BackendConfig {
    /// Loads the common settings and the dependency endpoints from the
    /// environment. Missing endpoints and credentials are not an error here;
    /// the client that needs them fails during startup instead.
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // An empty variable behaves like an unset one.
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(BackendConfig {
            common,
            mongodb: MongoConfig {
                uri: get("MONGO_URI"),
                database: get("MONGO_DB").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                server_selection_timeout: Duration::from_millis(parse_or(
                    "MONGO_SERVER_SELECTION_TIMEOUT_MS",
                    get("MONGO_SERVER_SELECTION_TIMEOUT_MS"),
                    5_000,
                )?),
            },
            redis: RedisConfig {
                host: get("REDIS_HOST"),
                port: parse_or("REDIS_PORT", get("REDIS_PORT"), DEFAULT_REDIS_PORT)?,
                password: get("REDIS_PASSWORD").map(Secret::new),
            },
            minio: MinioConfig {
                endpoint: get("MINIO_ENDPOINT"),
                port: parse_or("MINIO_PORT", get("MINIO_PORT"), DEFAULT_MINIO_PORT)?,
                use_ssl: get("MINIO_USE_SSL")
                    .map(|value| value.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
                access_key: get("MINIO_ACCESS_KEY"),
                secret_key: get("MINIO_SECRET_KEY").map(Secret::new),
                bucket: get("MINIO_BUCKET"),
                region: get("MINIO_REGION").unwrap_or_else(|| DEFAULT_BUCKET_REGION.to_string()),
            },
            integration: IntegrationConfig {
                base_url: get("INTEGRATION_BASE_URL"),
            },
            downstream_timeout: Duration::from_millis(parse_or(
                "DOWNSTREAM_TIMEOUT_MS",
                get("DOWNSTREAM_TIMEOUT_MS"),
                10_000,
            )?),
        })
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
        }),
    }
}
