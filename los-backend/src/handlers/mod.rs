pub mod cache;
pub mod documents;
pub mod health;
pub mod integration;
pub mod metrics;
pub mod objects;

pub use cache::increment_counter;
pub use documents::{count_documents, insert_document};
pub use health::health_check;
pub use integration::ping_integration;
pub use metrics::metrics;
pub use objects::{list_objects, upload_object};
