use crate::services::ObjectSummary;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ListObjectsResponse {
    pub bucket: String,
    pub files: Vec<ObjectSummary>,
}

#[derive(Debug, Serialize)]
pub struct ListObjectsFailure {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub uploaded: String,
}
