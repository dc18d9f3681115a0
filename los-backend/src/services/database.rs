use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson, Document},
    options::ClientOptions,
    Client as MongoClient, Database,
};
use serde_json::{Map, Value};
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Collection used by the count and insert routes.
pub const DOCUMENTS_COLLECTION: &str = "documents";

/// Field that receives the server-side creation time of an inserted document.
pub const CREATED_AT_FIELD: &str = "at";

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Runs the `ping` command; `true` when the reply carries `ok: 1`.
    async fn ping(&self) -> Result<bool, AppError>;
    async fn count(&self, collection: &str) -> Result<u64, AppError>;
    /// Stamps `fields` with the current time under [`CREATED_AT_FIELD`],
    /// persists it and returns the assigned identifier.
    async fn insert_one(&self, collection: &str, fields: Map<String, Value>)
        -> Result<Value, AppError>;
    /// Releases the connection pool. Calls made afterwards fail.
    async fn close(&self) {}
}

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    /// Connects and pings, so an unreachable server fails startup once
    /// `server_selection_timeout` elapses instead of on the first request.
    pub async fn connect(
        uri: Option<&str>,
        database: &str,
        server_selection_timeout: Duration,
    ) -> Result<Self, AppError> {
        let uri = uri.ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!("MONGO_URI is required but not set"))
        })?;

        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
        options.app_name = Some("los-backend".to_string());
        options.server_selection_timeout = Some(server_selection_timeout);

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);

        db.run_command(doc! { "ping": 1 }, None).await.map_err(|e| {
            tracing::error!(
                timeout_ms = server_selection_timeout.as_millis() as u64,
                "MongoDB unreachable: {}",
                e
            );
            AppError::from(e)
        })?;

        tracing::info!(database = %database, "Connected to MongoDB");
        Ok(Self { client, db })
    }
}

fn reply_ok(reply: &Document) -> bool {
    match reply.get("ok") {
        Some(Bson::Double(ok)) => *ok == 1.0,
        Some(Bson::Int32(ok)) => *ok == 1,
        Some(Bson::Int64(ok)) => *ok == 1,
        _ => false,
    }
}

fn inserted_id_json(id: Bson) -> Value {
    match id {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => other.into_relaxed_extjson(),
    }
}

#[async_trait]
impl DocumentStore for MongoDb {
    async fn ping(&self) -> Result<bool, AppError> {
        let reply = self.db.run_command(doc! { "ping": 1 }, None).await.map_err(|e| {
            tracing::error!("MongoDB ping failed: {}", e);
            AppError::from(e)
        })?;
        Ok(reply_ok(&reply))
    }

    async fn count(&self, collection: &str) -> Result<u64, AppError> {
        self.db
            .collection::<Document>(collection)
            .count_documents(None, None)
            .await
            .map_err(|e| {
                tracing::error!(collection, "Failed to count documents: {}", e);
                AppError::from(e)
            })
    }

    async fn insert_one(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let mut document = bson::to_document(&fields).map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Document cannot be stored: {}", e))
        })?;
        document.insert(CREATED_AT_FIELD, bson::DateTime::from_chrono(Utc::now()));

        let result = self
            .db
            .collection::<Document>(collection)
            .insert_one(document, None)
            .await
            .map_err(|e| {
                tracing::error!(collection, "Failed to insert document: {}", e);
                AppError::from(e)
            })?;

        Ok(inserted_id_json(result.inserted_id))
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        tracing::info!("MongoDB client closed");
    }
}

/// In-memory store for tests: documents are kept as JSON with `at` as RFC 3339.
pub struct MockDocumentStore {
    pub collections: Mutex<HashMap<String, Vec<Map<String, Value>>>>,
    pub healthy: AtomicBool,
    pub closed: AtomicBool,
}

impl Default for MockDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            healthy: AtomicBool::new(true),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn documents(&self, collection: &str) -> Vec<Map<String, Value>> {
        self.collections
            .lock()
            .map(|collections| collections.get(collection).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn ping(&self) -> Result<bool, AppError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(true)
        } else {
            Err(AppError::DatabaseError(anyhow::anyhow!(
                "Server selection timeout: No available servers"
            )))
        }
    }

    async fn count(&self, collection: &str) -> Result<u64, AppError> {
        Ok(self.documents(collection).len() as u64)
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut fields: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let id = ObjectId::new().to_hex();
        fields.insert(
            CREATED_AT_FIELD.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        fields.insert("_id".to_string(), Value::String(id.clone()));

        self.collections
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock document store mutex poisoned: {}", e))?
            .entry(collection.to_string())
            .or_default()
            .push(fields);

        Ok(Value::String(id))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ping_reply_ok_accepts_int_and_double() {
        assert!(reply_ok(&doc! { "ok": 1.0 }));
        assert!(reply_ok(&doc! { "ok": 1 }));
        assert!(reply_ok(&doc! { "ok": 1_i64 }));
        assert!(!reply_ok(&doc! { "ok": 0.0 }));
        assert!(!reply_ok(&doc! {}));
    }

    #[test]
    fn object_id_is_rendered_as_hex() {
        let oid = ObjectId::new();
        assert_eq!(inserted_id_json(Bson::ObjectId(oid)), json!(oid.to_hex()));
        assert_eq!(inserted_id_json(Bson::Int32(5)), json!(5));
    }

    #[tokio::test]
    async fn connect_without_uri_is_a_config_error() {
        let err = MongoDb::connect(None, "los", Duration::from_millis(100))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[tokio::test]
    async fn mock_insert_stamps_time_and_counts() {
        let store = MockDocumentStore::new();
        let fields = json!({ "name": "alice" }).as_object().cloned().unwrap();

        let id = store.insert_one(DOCUMENTS_COLLECTION, fields).await.unwrap();

        let stored = store.documents(DOCUMENTS_COLLECTION);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["name"], "alice");
        assert!(stored[0].contains_key(CREATED_AT_FIELD));
        assert_eq!(stored[0]["_id"], id);
        assert_eq!(store.count(DOCUMENTS_COLLECTION).await.unwrap(), 1);
    }
}
