//! Request dispatch: resolve, invoke, and guarantee a response.

use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::dispatch::table::{Resolution, RouteTable};
use crate::http::context::RequestContext;
use crate::http::response::{Reply, NOT_FOUND_BODY, NOT_FOUND_STATUS, SERVER_ERROR_BODY};
use crate::observability::metrics;
use crate::routing::compiler::CompiledRoute;
use crate::routing::handler::{BoxError, Handler, HandlerResolver, HandlerResult};

/// Why a matched route did not produce a reply.
#[derive(Debug, Error)]
pub enum HandlerFailure {
    #[error("handler returned an error: {0}")]
    Error(#[source] BoxError),

    #[error("handler panicked: {0}")]
    Panic(String),

    #[error("no handler registered for `{0}`")]
    Unresolved(String),

    #[error("route has no handler")]
    Missing,
}

impl HandlerFailure {
    fn kind(&self) -> &'static str {
        match self {
            Self::Error(_) => "error",
            Self::Panic(_) => "panic",
            Self::Unresolved(_) | Self::Missing => "unresolved",
        }
    }
}

/// Receives handler failures caught at the dispatch boundary.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, ctx: &RequestContext, route: &CompiledRoute, failure: &HandlerFailure);
}

/// Logs failures as `tracing` errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, ctx: &RequestContext, route: &CompiledRoute, failure: &HandlerFailure) {
        tracing::error!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            route = %route.key(),
            error = %failure,
            "Handler failed"
        );
    }
}

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    NotFound,
    Failed,
}

impl DispatchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::NotFound => "not_found",
            Self::Failed => "failed",
        }
    }
}

/// Matches requests against a [`RouteTable`] and runs the bound handler
/// exactly once.
pub struct Dispatcher {
    table: RouteTable,
    resolver: Arc<dyn HandlerResolver>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Dispatcher {
    pub fn new(table: RouteTable, resolver: Arc<dyn HandlerResolver>) -> Self {
        Self {
            table,
            resolver,
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Resolve and run the handler for `ctx`, awaiting it.
    ///
    /// Every call leaves the response committed: the handler's own write,
    /// its returned reply, the fixed 404, or a 500 when it failed first.
    pub async fn dispatch(&self, ctx: RequestContext) -> DispatchOutcome {
        let start = Instant::now();

        let outcome = match self.table.resolve(ctx.method(), ctx.path()) {
            Resolution::NotFound => {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    path = %ctx.path(),
                    "No route matched"
                );
                ctx.respond_with(NOT_FOUND_STATUS, NOT_FOUND_BODY.clone());
                DispatchOutcome::NotFound
            }
            Resolution::Found { route, params, source } => {
                ctx.bind_params(params);
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    route = %route.key(),
                    source = ?source,
                    "Dispatching"
                );
                self.run(&route, &ctx).await
            }
        };

        metrics::record_dispatch(ctx.method(), outcome.as_str(), start);
        outcome
    }

    /// Spawn the dispatch and return immediately. Failures are reported by
    /// the spawned task.
    pub fn dispatch_detached(self: &Arc<Self>, ctx: RequestContext) -> JoinHandle<DispatchOutcome> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(ctx).await })
    }

    async fn run(&self, route: &CompiledRoute, ctx: &RequestContext) -> DispatchOutcome {
        match self.invoke(route, ctx).await {
            Ok(reply) => {
                if !ctx.responded() {
                    ctx.send(reply);
                }
                DispatchOutcome::Handled
            }
            Err(failure) => {
                metrics::record_handler_failure(failure.kind());
                self.reporter.report(ctx, route, &failure);
                if !ctx.responded() {
                    ctx.respond_with(axum::http::StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY.clone());
                }
                DispatchOutcome::Failed
            }
        }
    }

    async fn invoke(&self, route: &CompiledRoute, ctx: &RequestContext) -> Result<Reply, HandlerFailure> {
        let handler = match route.handler() {
            None => return Err(HandlerFailure::Missing),
            Some(Handler::Named(identifier)) => self
                .resolver
                .resolve(identifier)
                .ok_or_else(|| HandlerFailure::Unresolved(identifier.clone()))?,
            Some(handler) => handler.clone(),
        };

        let result: std::thread::Result<HandlerResult> = match handler {
            Handler::Inline(f) => std::panic::catch_unwind(AssertUnwindSafe(|| f(ctx))),
            Handler::InlineAsync(f) => {
                let ctx = ctx.clone();
                AssertUnwindSafe(async move { f(ctx).await }).catch_unwind().await
            }
            Handler::Named(identifier) => return Err(HandlerFailure::Unresolved(identifier)),
        };

        match result {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(error)) => Err(HandlerFailure::Error(error)),
            Err(payload) => Err(HandlerFailure::Panic(panic_message(&*payload))),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("routes", &self.table.len()).finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
