//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, normalization)
//!
//! The body size limit is enforced while normalizing, so oversized requests
//! get the same JSON error and metrics whether or not they declare a length.
//! - Bind server to listener and serve until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::capture::{ArtifactStore, CaptureSink, FsStore};
use crate::config::InspectorConfig;
use crate::http::handlers;
use crate::http::middleware::normalize_request;
use crate::lifecycle::wait_for_shutdown;
use crate::observability::{RequestObserver, TracingObserver};

/// Capture sink over a type-erased store.
pub type SharedSink = CaptureSink<Arc<dyn ArtifactStore>>;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub sink: Option<Arc<SharedSink>>,
    pub observer: Option<Arc<dyn RequestObserver>>,
    pub max_body_bytes: usize,
}

impl AppState {
    /// State derived from configuration: filesystem captures, tracing observer.
    pub fn from_config(config: &InspectorConfig) -> Self {
        Self::with_store(config, Arc::new(FsStore))
    }

    /// Same as [`AppState::from_config`] but persisting through `store`.
    pub fn with_store(config: &InspectorConfig, store: Arc<dyn ArtifactStore>) -> Self {
        let sink = config
            .capture
            .enabled
            .then(|| Arc::new(CaptureSink::new(store, config.capture.directory.clone())));
        let observer = config
            .observability
            .log_requests
            .then(|| Arc::new(TracingObserver) as Arc<dyn RequestObserver>);

        Self {
            sink,
            observer,
            max_body_bytes: config.limits.max_body_bytes,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// HTTP server for the inspector.
pub struct HttpServer {
    router: Router,
    config: InspectorConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: InspectorConfig) -> Self {
        let state = AppState::from_config(&config);
        Self::with_state(config, state)
    }

    pub fn with_state(config: InspectorConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// Run the server until Ctrl+C or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            capture_dir = %self.config.capture.directory.display(),
            capture_enabled = self.config.capture.enabled,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &InspectorConfig, state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/api/status", get(handlers::status))
        .route("/api/data", post(handlers::receive_data))
        .route("/api/echo", get(handlers::echo))
        .route(
            "/api/inspect",
            get(handlers::inspect)
                .post(handlers::inspect)
                .put(handlers::inspect)
                .delete(handlers::inspect)
                .patch(handlers::inspect)
                .options(handlers::inspect)
                .head(handlers::inspect),
        )
        .route("/api/capture", any(handlers::capture))
        .route(
            "/{*path}",
            get(handlers::catch_all)
                .post(handlers::catch_all)
                .put(handlers::catch_all)
                .delete(handlers::catch_all)
                .patch(handlers::catch_all),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), normalize_request))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.limits.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
}
