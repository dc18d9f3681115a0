use crate::dtos::{CountResponse, InsertDocumentRequest, InsertResponse};
use crate::services::{database::DOCUMENTS_COLLECTION, with_deadline};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn count_documents(
    State(state): State<AppState>,
) -> Result<Json<CountResponse>, AppError> {
    let count = with_deadline(
        state.config.downstream_timeout,
        "mongo count",
        state.documents.count(DOCUMENTS_COLLECTION),
    )
    .await?;

    Ok(Json(CountResponse { count }))
}

pub async fn insert_document(
    State(state): State<AppState>,
    payload: Result<Json<InsertDocumentRequest>, JsonRejection>,
) -> Result<Json<InsertResponse>, AppError> {
    let Json(request) =
        payload.map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;
    request.validate()?;

    let inserted_id = with_deadline(
        state.config.downstream_timeout,
        "mongo insert",
        state.documents.insert_one(DOCUMENTS_COLLECTION, request.doc),
    )
    .await?;

    tracing::info!(inserted_id = %inserted_id, "Document inserted");
    Ok(Json(InsertResponse { inserted_id }))
}
