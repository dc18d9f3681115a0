use crate::config::RedisConfig;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Reply a healthy server gives to `PING`.
pub const PONG: &str = "PONG";

#[async_trait]
pub trait CounterCache: Send + Sync {
    /// Returns the server's liveness token; callers compare it with [`PONG`].
    async fn ping(&self) -> Result<String, AppError>;
    /// Atomically adds one to the integer at `key`, starting from 0, and
    /// returns the new value.
    async fn increment(&self, key: &str) -> Result<i64, AppError>;
}

#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

fn connection_url(config: &RedisConfig) -> Result<String, AppError> {
    let host = config.host.as_deref().ok_or_else(|| {
        AppError::ConfigError(anyhow::anyhow!("REDIS_HOST is required but not set"))
    })?;

    Ok(match &config.password {
        Some(password) => format!(
            "redis://:{}@{}:{}/",
            urlencoding::encode(password.expose_secret()),
            host,
            config.port
        ),
        None => format!("redis://{}:{}/", host, config.port),
    })
}

impl RedisCache {
    /// Opens the connection now rather than on first use, so a wrong host or
    /// password stops startup.
    pub async fn connect(config: &RedisConfig) -> Result<Self, AppError> {
        let url = connection_url(config)?;
        tracing::info!(host = ?config.host, port = config.port, "Connecting to Redis");
        let client = Client::open(url)?;

        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to connect to Redis: {}", e);
            AppError::from(e)
        })?;

        tracing::info!("Connected to Redis");
        Ok(Self { manager })
    }
}

#[async_trait]
impl CounterCache for RedisCache {
    async fn ping(&self) -> Result<String, AppError> {
        let mut conn = self.manager.clone();
        let reply: String = redis::cmd("PING").query_async(&mut conn).await.map_err(|e| {
            tracing::error!("Redis ping failed: {}", e);
            AppError::from(e)
        })?;
        Ok(reply)
    }

    async fn increment(&self, key: &str) -> Result<i64, AppError> {
        let mut conn = self.manager.clone();
        let value: i64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(key, "Redis INCR failed: {}", e);
                AppError::from(e)
            })?;
        Ok(value)
    }
}

pub struct MockCache {
    pub counters: Mutex<HashMap<String, i64>>,
    pub healthy: AtomicBool,
    /// Added before every `PING` reply, in milliseconds.
    pub ping_delay_ms: AtomicU64,
}

impl Default for MockCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCache {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
            healthy: AtomicBool::new(true),
            ping_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_ping_delay(&self, delay: Duration) {
        self.ping_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl CounterCache for MockCache {
    async fn ping(&self) -> Result<String, AppError> {
        let delay = self.ping_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.healthy.load(Ordering::SeqCst) {
            Ok(PONG.to_string())
        } else {
            Err(AppError::from(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Connection refused",
            ))))
        }
    }

    async fn increment(&self, key: &str) -> Result<i64, AppError> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock cache mutex poisoned: {}", e))?;
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}
