use crate::dtos::{cache::MAX_KEY_LEN, IncrementResponse};
use crate::services::with_deadline;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

pub async fn increment_counter(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<IncrementResponse>, AppError> {
    if key.len() > MAX_KEY_LEN {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "key must be at most {} bytes",
            MAX_KEY_LEN
        )));
    }

    let value = with_deadline(
        state.config.downstream_timeout,
        "redis incr",
        state.cache.increment(&key),
    )
    .await?;

    Ok(Json(IncrementResponse { key, value }))
}
