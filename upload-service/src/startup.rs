use crate::config::{CorsConfig, UploadConfig};
use crate::handlers;
use crate::services::{FileRepository, LocalStorage, MongoDb, Storage};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    make_request_span, metrics_middleware, request_id_middleware, security_headers_middleware,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: UploadConfig,
    pub files: Arc<dyn FileRepository>,
    pub storage: Arc<dyn Storage>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    /// Connects to MongoDB, prepares the storage directory and binds the listener.
    pub async fn build(config: UploadConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        Self::build_with_repository(config, Arc::new(db)).await
    }

    /// Same as [`Application::build`] with a caller-supplied record store.
    pub async fn build_with_repository(
        config: UploadConfig,
        files: Arc<dyn FileRepository>,
    ) -> Result<Self, AppError> {
        let directory = config.storage.directory();
        let storage: Arc<dyn Storage> =
            Arc::new(LocalStorage::new(&directory).await.map_err(|e| {
                tracing::error!(
                    "Failed to initialize local storage at {}: {}",
                    directory.display(),
                    e
                );
                e
            })?);

        Self::build_with(config, files, storage).await
    }

    pub async fn build_with(
        config: UploadConfig,
        files: Arc<dyn FileRepository>,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, AppError> {
        let state = AppState {
            config: config.clone(),
            files,
            storage,
        };

        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            mode = ?config.storage.mode,
            directory = %config.storage.directory().display(),
            url_host = %config.public.url_host,
            "Listening"
        );

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

pub fn build_router(state: AppState) -> Router {
    let mode = state.config.storage.mode;
    let directory = state.config.storage.directory();
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route(
            "/api/upload",
            post(handlers::upload_file).layer(DefaultBodyLimit::disable()),
        )
        .nest_service(mode.route_prefix(), ServeDir::new(directory))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        // Outside the trace layer so generated ids reach the span.
        .layer(from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(
            config
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                        None
                    }
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
