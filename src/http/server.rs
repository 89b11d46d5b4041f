//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, auth)
//! - Build the gateway once and share it with every handler
//! - Serve until a shutdown signal arrives

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AccessToken, GatewayConfig};
use crate::gateway::{Gateway, GatewayBuildError};
use crate::http::{auth, handlers, request::MakeRequestUuid};
use crate::lifecycle::shutdown::shutdown_requested;
use crate::observability::tracing::request_span;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub api_key: Option<AccessToken>,
}

/// HTTP server for the deposition gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayBuildError> {
        let gateway = Gateway::from_config(&config.upstream, config.observability.verbose)?;

        let state = AppState {
            gateway: Arc::new(gateway),
            api_key: config.auth.api_key.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let operations = Router::new()
            .route("/docs", get(handlers::list_depositions))
            .route("/docs/{id}", get(handlers::get_deposition))
            .route("/create", post(handlers::create_deposition))
            .route("/add", put(handlers::upload_without_target))
            .route("/add/{*target}", put(handlers::upload_file))
            .route("/update", put(handlers::update_without_id))
            .route("/update/{id}", put(handlers::update_metadata))
            .route("/publish", post(handlers::publish_without_id))
            .route("/publish/{id}", post(handlers::publish_deposition))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_api_key));

        Router::new()
            .route("/status", get(handlers::status))
            .merge(operations)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(SetResponseHeaderLayer::if_not_present(
                        header::X_CONTENT_TYPE_OPTIONS,
                        HeaderValue::from_static("nosniff"),
                    ))
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.listener.request_timeout_secs,
                    ))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_requested(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
