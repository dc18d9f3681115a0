use serde::{Deserialize, Serialize};

/// Keys longer than this are rejected before reaching Redis.
pub const MAX_KEY_LEN: usize = 512;

#[derive(Debug, Serialize, Deserialize)]
pub struct IncrementResponse {
    pub key: String,
    pub value: i64,
}
