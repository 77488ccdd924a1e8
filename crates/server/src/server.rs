use axum::{extract::DefaultBodyLimit, Router};
use imagemill_core::config::{BackendKind, CoreConfig, ServerConfig};
use imagemill_core::Processor;
use imagemill_storage::{StorageConfig, StorageType};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use crate::{
    routes::{create_router, AppState},
    ServerError, ServerResult,
};

/// Manages the HTTP server: wires configuration into the storage sink and
/// processor, builds the router, and serves until shutdown.
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    pub async fn new(config: CoreConfig) -> ServerResult<Self> {
        info!("Initializing imagemill server...");

        // Convert core storage settings to the storage crate's config
        let storage_config = StorageConfig {
            storage_type: match config.storage.backend {
                BackendKind::Local => StorageType::Local {
                    path: config.storage.local.base_path.clone(),
                },
                BackendKind::S3 => StorageType::S3 {
                    bucket: config.storage.s3.bucket.clone(),
                    region: config.storage.s3.region.clone(),
                    access_key_id: config.storage.s3.access_key_id.clone(),
                    secret_access_key: config.storage.s3.secret_access_key.clone(),
                    endpoint: config.storage.s3.endpoint.clone(),
                },
            },
            public_domain: config.storage.public_domain.clone(),
        };

        // One configured sink reused across all concurrent requests
        let sink = storage_config
            .create_sink()
            .await
            .map_err(|e| ServerError::Internal(format!("Storage initialization failed: {}", e)))?;

        let processor = Arc::new(Processor::new(sink, config.features.clone()));

        let router = create_app_router(AppState { processor }, &config.server);

        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| ServerError::Internal(format!("Invalid server address: {}", e)))?;

        Ok(Self { router, addr })
    }

    pub async fn serve(self) -> ServerResult<()> {
        info!("imagemill server listening on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", self.addr, e)))?;

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))
    }
}

fn create_app_router(state: AppState, config: &ServerConfig) -> Router {
    create_router(state).layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_request(DefaultOnRequest::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout)))
            .layer(DefaultBodyLimit::max(config.max_request_size)),
    )
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received, draining connections");
}
