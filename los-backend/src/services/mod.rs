pub mod cache;
pub mod database;
pub mod integration;
pub mod metrics;
pub mod object_store;

pub use cache::{CounterCache, MockCache, RedisCache};
pub use database::{DocumentStore, MockDocumentStore, MongoDb};
pub use integration::{IntegrationClient, IntegrationService};
pub use metrics::{get_metrics, init_metrics};
pub use object_store::{BucketOutcome, MockObjectStore, ObjectStore, ObjectSummary, S3ObjectStore};

use service_core::error::AppError;
use std::future::Future;
use std::time::Duration;

/// Runs one downstream call under `deadline`. An expired deadline becomes a
/// 504 naming the operation.
pub async fn with_deadline<T, F>(deadline: Duration, operation: &str, call: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, timeout_ms = deadline.as_millis() as u64, "Downstream call timed out");
            Err(AppError::GatewayTimeout(format!(
                "{} did not complete within {}ms",
                operation,
                deadline.as_millis()
            )))
        }
    }
}
