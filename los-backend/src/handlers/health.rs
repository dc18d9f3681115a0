use crate::dtos::{HealthFailure, HealthSnapshot};
use crate::services::{cache::PONG, with_deadline};
use crate::startup::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;

/// Pings the document store, then the cache. Any failure, including a missed
/// deadline, is reported as `500 {status: "error", message}`.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let deadline = state.config.downstream_timeout;

    let snapshot = async {
        let mongo = with_deadline(deadline, "mongo ping", state.documents.ping()).await?;
        let redis = with_deadline(deadline, "redis ping", state.cache.ping()).await?;
        Ok::<_, AppError>(HealthSnapshot::new(mongo, redis == PONG))
    }
    .await;

    match snapshot {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthFailure::new(e.to_string())),
            )
                .into_response()
        }
    }
}
