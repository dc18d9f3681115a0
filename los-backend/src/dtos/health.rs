use serde::{Deserialize, Serialize};

/// Per-request liveness of the document store and the cache.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub status: String,
    pub mongo: bool,
    pub redis: bool,
}

impl HealthSnapshot {
    pub fn new(mongo: bool, redis: bool) -> Self {
        Self {
            status: "ok".to_string(),
            mongo,
            redis,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthFailure {
    pub status: String,
    pub message: String,
}

impl HealthFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}
