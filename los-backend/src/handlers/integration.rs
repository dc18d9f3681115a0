use crate::services::with_deadline;
use crate::startup::AppState;
use axum::{extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};
use service_core::error::AppError;
use service_core::middleware::tracing::REQUEST_ID_HEADER;

pub async fn ping_integration(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok());

    let data = with_deadline(
        state.config.downstream_timeout,
        "integration ping",
        state.integration.ping(request_id),
    )
    .await?;

    Ok(Json(json!({ "integration": data })))
}
