pub mod cache;
pub mod documents;
pub mod health;
pub mod objects;

pub use cache::IncrementResponse;
pub use documents::{CountResponse, InsertDocumentRequest, InsertResponse};
pub use health::{HealthFailure, HealthSnapshot};
pub use objects::{ListObjectsFailure, ListObjectsResponse, UploadResponse};
