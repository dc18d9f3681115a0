//! Test helpers: the real router, served on an ephemeral port, backed by
//! in-memory clients that the tests can inspect and break.

#![allow(dead_code)]

use los_backend::config::{BackendConfig, IntegrationConfig};
use los_backend::services::{
    IntegrationClient, IntegrationService, MockCache, MockDocumentStore, MockObjectStore,
};
use los_backend::startup::{AppState, Application};
use service_core::config::Config as CoreConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const TEST_BUCKET: &str = "los-test";

pub fn test_config(vars: &[(&str, &str)]) -> BackendConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let mut common = CoreConfig::default();
    common.port = 0;
    BackendConfig::from_lookup(common, |key| vars.get(key).cloned())
        .expect("Failed to build test configuration")
}

pub struct TestApp {
    pub address: String,
    pub documents: Arc<MockDocumentStore>,
    pub cache: Arc<MockCache>,
    pub objects: Arc<MockObjectStore>,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<std::io::Result<()>>>,
}

impl TestApp {
    /// Integration calls go to `integration_base_url`, if given.
    pub async fn spawn_with_integration(integration_base_url: Option<String>) -> Self {
        Self::spawn_with(&[("DOWNSTREAM_TIMEOUT_MS", "2000")], integration_base_url).await
    }

    pub async fn spawn_with(
        vars: &[(&str, &str)],
        integration_base_url: Option<String>,
    ) -> Self {
        let config = test_config(vars);
        let integration: Arc<dyn IntegrationService> = Arc::new(
            IntegrationClient::new(
                &IntegrationConfig {
                    base_url: integration_base_url,
                },
                config.downstream_timeout,
            )
            .expect("Failed to build integration client"),
        );

        let documents = Arc::new(MockDocumentStore::new());
        let cache = Arc::new(MockCache::new());
        let objects = Arc::new(MockObjectStore::new(TEST_BUCKET));

        let state = AppState {
            config,
            documents: documents.clone(),
            cache: cache.clone(),
            objects: objects.clone(),
            integration,
        };

        let app = Application::with_state(state)
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(app.run_until(async move {
            rx.await.ok();
        }));

        TestApp {
            address,
            documents,
            cache,
            objects,
            shutdown: Some(tx),
            server: Some(server),
        }
    }

    /// Signals shutdown and waits for the server to finish.
    pub async fn stop(&mut self) -> std::io::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.server.take() {
            Some(server) => server.await.expect("Server task panicked"),
            None => Ok(()),
        }
    }

    pub async fn spawn() -> Self {
        Self::spawn_with_integration(None).await
    }

    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
