//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single fallback handler
//! - Wire up middleware (tracing, timeouts)
//! - Turn each request into a `RequestContext` and hand it to the dispatcher
//! - Serve until the shutdown coordinator fires

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    response::Response,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::http::context::RequestContext;
use crate::http::transport::{AxumBody, BufferedResponse, Inbound, ResponseSink};
use crate::lifecycle::Shutdown;

/// Response header carrying the per-request id.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_size: usize,
}

/// HTTP front end for a [`Dispatcher`].
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(dispatcher: Arc<Dispatcher>, config: ServerConfig) -> Self {
        let state = AppState {
            dispatcher,
            max_body_size: config.max_body_size,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled Axum router, for embedding or in-process testing.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server on `listener` until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Every request lands here; routing happens in the dispatcher.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let inbound = Inbound::new(parts.method, parts.uri, parts.headers)
        .with_body(AxumBody::new(body, state.max_body_size));

    let sink = Arc::new(BufferedResponse::new());
    let ctx = RequestContext::new(inbound, sink.clone());
    if let Ok(value) = HeaderValue::from_str(&ctx.request_id().to_string()) {
        sink.set_header(X_REQUEST_ID.clone(), value);
    }

    state.dispatcher.dispatch(ctx).await;
    sink.to_response()
}
