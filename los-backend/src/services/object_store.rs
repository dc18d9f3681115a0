use crate::config::MinioConfig;
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client as S3Client;
use secrecy::ExposeSecret;
use serde::Serialize;
use service_core::error::AppError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Region that S3 expects to be sent without a location constraint.
const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    pub name: String,
    pub size: i64,
    pub etag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketOutcome {
    AlreadyExists,
    Created,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    /// `Ok(false)` only when the store says the bucket does not exist. Any
    /// other failure to answer is an error, never "absent".
    async fn bucket_exists(&self) -> Result<bool, AppError>;
    async fn create_bucket(&self, region: &str) -> Result<(), AppError>;
    /// Every object in the bucket, following continuation tokens to the end.
    async fn list_objects(&self) -> Result<Vec<ObjectSummary>, AppError>;
    async fn put_object(&self, name: &str, data: Vec<u8>) -> Result<String, AppError>;

    /// Creates the bucket when, and only when, the store reports it missing.
    async fn ensure_bucket(&self, region: &str) -> Result<BucketOutcome, AppError> {
        if self.bucket_exists().await? {
            tracing::info!(bucket = %self.bucket(), "Bucket exists");
            return Ok(BucketOutcome::AlreadyExists);
        }

        self.create_bucket(region).await?;
        tracing::info!(bucket = %self.bucket(), region, "Bucket created");
        Ok(BucketOutcome::Created)
    }
}

/// S3-compatible store addressed path-style, as MinIO expects.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

fn endpoint_url(config: &MinioConfig) -> Result<String, AppError> {
    let endpoint = config.endpoint.as_deref().ok_or_else(|| {
        AppError::ConfigError(anyhow::anyhow!("MINIO_ENDPOINT is required but not set"))
    })?;
    let scheme = if config.use_ssl { "https" } else { "http" };
    Ok(format!("{}://{}:{}", scheme, endpoint, config.port))
}

fn normalize_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

impl S3ObjectStore {
    /// Builds the client only; no request is made until the bucket is ensured.
    pub fn connect(config: &MinioConfig) -> Result<Self, AppError> {
        let endpoint = endpoint_url(config)?;
        let bucket = config.bucket.clone().ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!("MINIO_BUCKET is required but not set"))
        })?;

        let credentials = Credentials::new(
            config.access_key.clone().unwrap_or_default(),
            config
                .secret_key
                .as_ref()
                .map(|key| key.expose_secret().clone())
                .unwrap_or_default(),
            None,
            None,
            "los-backend",
        );

        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&endpoint)
            .force_path_style(true)
            .build();

        tracing::info!(endpoint = %endpoint, bucket = %bucket, "Object store client ready");
        Ok(Self {
            client: S3Client::from_conf(s3_config),
            bucket,
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn bucket_exists(&self) -> Result<bool, AppError> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let not_found = matches!(&err, SdkError::ServiceError(service) if service.err().is_not_found())
                    || err.raw_response().map(|raw| raw.status().as_u16()) == Some(404);
                if not_found {
                    Ok(false)
                } else {
                    tracing::error!(bucket = %self.bucket, "Bucket existence check failed: {:?}", err);
                    Err(AppError::ObjectStoreError(anyhow::anyhow!(
                        "Bucket existence check failed for {}: {}",
                        self.bucket,
                        err
                    )))
                }
            }
        }
    }

    async fn create_bucket(&self, region: &str) -> Result<(), AppError> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request.send().await.map_err(|e| {
            tracing::error!(bucket = %self.bucket, "Failed to create bucket: {:?}", e);
            AppError::ObjectStoreError(anyhow::anyhow!(
                "Failed to create bucket {}: {}",
                self.bucket,
                e
            ))
        })?;
        Ok(())
    }

    async fn list_objects(&self) -> Result<Vec<ObjectSummary>, AppError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        let mut files = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                tracing::error!(bucket = %self.bucket, "Failed to list objects: {:?}", e);
                AppError::ObjectStoreError(anyhow::anyhow!(
                    "Failed to list objects in {}: {}",
                    self.bucket,
                    e
                ))
            })?;

            files.extend(page.contents().iter().map(|object| ObjectSummary {
                name: object.key().unwrap_or_default().to_string(),
                size: object.size().unwrap_or_default(),
                etag: object.e_tag().map(normalize_etag).unwrap_or_default(),
            }));
        }

        Ok(files)
    }

    async fn put_object(&self, name: &str, data: Vec<u8>) -> Result<String, AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(bucket = %self.bucket, name, "Failed to upload object: {:?}", e);
                AppError::ObjectStoreError(anyhow::anyhow!("Failed to upload {}: {}", name, e))
            })?;
        Ok(name.to_string())
    }
}

/// In-memory bucket for tests. Objects are kept in name order, like a listing.
pub struct MockObjectStore {
    pub bucket: String,
    pub objects: Mutex<BTreeMap<String, Vec<u8>>>,
    pub exists: AtomicBool,
    pub created: AtomicUsize,
    pub healthy: AtomicBool,
}

impl MockObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::new(BTreeMap::new()),
            exists: AtomicBool::new(false),
            created: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    fn check_healthy(&self) -> Result<(), AppError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::ObjectStoreError(anyhow::anyhow!(
                "Access Denied."
            )))
        }
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn bucket_exists(&self) -> Result<bool, AppError> {
        self.check_healthy()?;
        Ok(self.exists.load(Ordering::SeqCst))
    }

    async fn create_bucket(&self, _region: &str) -> Result<(), AppError> {
        self.check_healthy()?;
        if self.exists.swap(true, Ordering::SeqCst) {
            return Err(AppError::ObjectStoreError(anyhow::anyhow!(
                "BucketAlreadyOwnedByYou"
            )));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_objects(&self) -> Result<Vec<ObjectSummary>, AppError> {
        self.check_healthy()?;
        let objects = self
            .objects
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock object store mutex poisoned: {}", e))?;
        Ok(objects
            .iter()
            .map(|(name, data)| ObjectSummary {
                name: name.clone(),
                size: data.len() as i64,
                etag: format!("{:032x}", data.len()),
            })
            .collect())
    }

    async fn put_object(&self, name: &str, data: Vec<u8>) -> Result<String, AppError> {
        self.check_healthy()?;
        self.objects
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock object store mutex poisoned: {}", e))?
            .insert(name.to_string(), data);
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minio(endpoint: Option<&str>, use_ssl: bool) -> MinioConfig {
        MinioConfig {
            endpoint: endpoint.map(str::to_string),
            port: 9000,
            use_ssl,
            access_key: Some("minioadmin".to_string()),
            secret_key: None,
            bucket: Some("los".to_string()),
            region: DEFAULT_REGION.to_string(),
        }
    }

    #[test]
    fn endpoint_url_follows_tls_flag() {
        assert_eq!(endpoint_url(&minio(Some("minio"), false)).unwrap(), "http://minio:9000");
        assert_eq!(endpoint_url(&minio(Some("minio"), true)).unwrap(), "https://minio:9000");
    }

    #[test]
    fn missing_endpoint_is_a_config_error() {
        let err = endpoint_url(&minio(None, false)).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn etag_quotes_are_stripped() {
        assert_eq!(
            normalize_etag("\"5eb63bbbe01eeed093cb22bb8f5acdc3\""),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(normalize_etag("abc"), "abc");
    }

    #[tokio::test]
    async fn ensure_creates_missing_bucket_once() {
        let store = MockObjectStore::new("los");

        assert_eq!(
            store.ensure_bucket(DEFAULT_REGION).await.unwrap(),
            BucketOutcome::Created
        );
        assert_eq!(
            store.ensure_bucket(DEFAULT_REGION).await.unwrap(),
            BucketOutcome::AlreadyExists
        );
        assert_eq!(store.created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ensure_leaves_existing_bucket_alone() {
        let store = MockObjectStore::new("los");
        store.exists.store(true, Ordering::SeqCst);

        assert_eq!(
            store.ensure_bucket(DEFAULT_REGION).await.unwrap(),
            BucketOutcome::AlreadyExists
        );
        assert_eq!(store.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_existence_check_aborts_without_creating() {
        let store = MockObjectStore::new("los");
        store.set_healthy(false);

        let err = store.ensure_bucket(DEFAULT_REGION).await.unwrap_err();

        assert!(matches!(err, AppError::ObjectStoreError(_)));
        assert_eq!(store.created.load(Ordering::SeqCst), 0);
        assert!(!store.exists.load(Ordering::SeqCst));
    }
}
