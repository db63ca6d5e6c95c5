//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the gateway as its only handler
//! - Wire up middleware (request ID, tracing)
//! - Serve on a bound listener until shutdown is signalled

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::gateway::{Gateway, HttpUpstream, SetupError, Upstream};
use crate::http::request::{request_id, MakeRequestUuidV4};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a server that forwards to the configured upstream URL.
    pub fn new(config: GatewayConfig) -> Result<Self, SetupError> {
        let upstream = Arc::new(HttpUpstream::new(&config.upstream)?);
        Self::with_upstream(config, upstream)
    }

    /// Create a server around any upstream implementation.
    pub fn with_upstream(
        config: GatewayConfig,
        upstream: Arc<dyn Upstream>,
    ) -> Result<Self, SetupError> {
        let gateway = Arc::new(Gateway::new(&config, upstream)?);
        let router = Self::build_router(AppState { gateway });
        Ok(Self {
            router,
            config: Arc::new(config),
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Every method and path reaches the gateway; route matching is one of its guards.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(
                        |request: &Request<Body>| {
                            tracing::info_span!(
                                "request",
                                method = %request.method(),
                                path = %request.uri().path(),
                                request_id = %request_id(request.headers()),
                            )
                        },
                    ))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router, for in-process serving and tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown channel fires or closes.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Sole handler: hand the request to the gateway pipeline.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.gateway.handle(request).await
}
