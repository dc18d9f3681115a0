use crate::config::BackendConfig;
use crate::handlers;
use crate::services::{
    CounterCache, DocumentStore, IntegrationClient, IntegrationService, MongoDb, ObjectStore,
    RedisCache, S3ObjectStore,
};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    tracing::{http_trace_layer, request_id_middleware},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;

/// Long-lived client handles, created once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: BackendConfig,
    pub documents: Arc<dyn DocumentStore>,
    pub cache: Arc<dyn CounterCache>,
    pub objects: Arc<dyn ObjectStore>,
    pub integration: Arc<dyn IntegrationService>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    Document,
    Cache,
    Object,
}

/// Startup only moves forward. A failure in any dependency ends in `Failed`;
/// there is no partially available state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    Unstarted,
    Initializing(Dependency),
    Listening,
    Failed(Dependency),
}

struct Bootstrap {
    phase: StartupPhase,
}

impl Bootstrap {
    fn new() -> Self {
        Self {
            phase: StartupPhase::Unstarted,
        }
    }

    fn enter(&mut self, phase: StartupPhase) {
        tracing::info!(from = ?self.phase, to = ?phase, "Startup phase");
        self.phase = phase;
    }

    fn fail(&mut self, dependency: Dependency, err: AppError) -> AppError {
        tracing::error!(dependency = ?dependency, error = %err, "Startup failed");
        self.phase = StartupPhase::Failed(dependency);
        err
    }
}

impl AppState {
    /// Connects the document store, then the cache, then the object store
    /// (ensuring its bucket), strictly in that order.
    pub async fn initialize(config: BackendConfig) -> Result<Self, AppError> {
        let mut bootstrap = Bootstrap::new();

        bootstrap.enter(StartupPhase::Initializing(Dependency::Document));
        let documents = MongoDb::connect(
            config.mongodb.uri.as_deref(),
            &config.mongodb.database,
            config.mongodb.server_selection_timeout,
        )
        .await
        .map_err(|e| bootstrap.fail(Dependency::Document, e))?;

        bootstrap.enter(StartupPhase::Initializing(Dependency::Cache));
        let cache = RedisCache::connect(&config.redis)
            .await
            .map_err(|e| bootstrap.fail(Dependency::Cache, e))?;

        bootstrap.enter(StartupPhase::Initializing(Dependency::Object));
        let objects = S3ObjectStore::connect(&config.minio)
            .map_err(|e| bootstrap.fail(Dependency::Object, e))?;
        objects
            .ensure_bucket(&config.minio.region)
            .await
            .map_err(|e| bootstrap.fail(Dependency::Object, e))?;

        let integration =
            IntegrationClient::new(&config.integration, config.downstream_timeout)?;

        Ok(Self {
            config,
            documents: Arc::new(documents),
            cache: Arc::new(cache),
            objects: Arc::new(objects),
            integration: Arc::new(integration),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/mongo/count", get(handlers::count_documents))
        .route("/mongo/insert", post(handlers::insert_document))
        .route("/redis/incr/:key", get(handlers::increment_counter))
        .route("/minio/list", get(handlers::list_objects))
        .route("/minio/upload", post(handlers::upload_object))
        .route("/integration/ping", get(handlers::ping_integration));

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(http_trace_layer())
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    pub async fn build(config: BackendConfig) -> Result<Self, AppError> {
        let state = AppState::initialize(config).await?;
        Self::with_state(state).await
    }

    /// Binds the listener for already-initialised clients. Port 0 picks a free port.
    pub async fn with_state(state: AppState) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(phase = ?StartupPhase::Listening, "Backend listening on :{}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serves until `shutdown` resolves, drains in-flight requests, then
    /// closes the document-store client. The other handles are dropped.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let documents = self.state.documents.clone();
        let app = build_router(self.state);

        let result = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        documents.close().await;
        tracing::info!("Backend shutdown complete");
        result
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
