use crate::dtos::{ListObjectsFailure, ListObjectsResponse, UploadResponse};
use crate::services::with_deadline;
use crate::startup::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

/// Body written by the upload route.
pub const DEMO_PAYLOAD: &[u8] = b"hello from backend";

/// `hello-<unix millis>.txt`
pub fn demo_object_name(now_millis: i64) -> String {
    format!("hello-{}.txt", now_millis)
}

pub async fn list_objects(State(state): State<AppState>) -> Response {
    let listing = with_deadline(
        state.config.downstream_timeout,
        "minio list",
        state.objects.list_objects(),
    )
    .await;

    match listing {
        Ok(files) => Json(ListObjectsResponse {
            bucket: state.objects.bucket().to_string(),
            files,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Listing objects failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ListObjectsFailure {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

pub async fn upload_object(
    State(state): State<AppState>,
) -> Result<Json<UploadResponse>, AppError> {
    let name = demo_object_name(Utc::now().timestamp_millis());

    let uploaded = with_deadline(
        state.config.downstream_timeout,
        "minio put",
        state.objects.put_object(&name, DEMO_PAYLOAD.to_vec()),
    )
    .await?;

    tracing::info!(name = %uploaded, "Object uploaded");
    Ok(Json(UploadResponse { uploaded }))
}
