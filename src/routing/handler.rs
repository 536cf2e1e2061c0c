//! Route handler references.
//!
//! A handler is either an inline callable (sync or async) or a string
//! identifier such as `"Admin::Users@index"` that an injected
//! [`HandlerResolver`] turns into a callable at dispatch time.

use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::http::context::RequestContext;
use crate::http::response::Reply;

/// Error type returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler returns. A non-empty [`Reply`] is sent unless the handler
/// already responded.
pub type HandlerResult = Result<Reply, BoxError>;

type SyncFn = dyn Fn(&RequestContext) -> HandlerResult + Send + Sync;
type AsyncFn = dyn Fn(RequestContext) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// A reference to the code that serves a route.
#[derive(Clone)]
pub enum Handler {
    /// Runs to completion on the dispatching task.
    Inline(Arc<SyncFn>),
    /// Awaited by the dispatcher.
    InlineAsync(Arc<AsyncFn>),
    /// Resolved through a [`HandlerResolver`].
    Named(String),
}

impl Handler {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Inline(Arc::new(f))
    }

    pub fn from_async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::InlineAsync(Arc::new(move |ctx| Box::pin(f(ctx))))
    }

    pub fn named(identifier: impl Into<String>) -> Self {
        Self::Named(identifier.into())
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::InlineAsync(_))
    }

    /// The string identifier, for named handlers.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::Named(id) => Some(id),
            _ => None,
        }
    }

    /// The action part of the identifier: the text after `@`, or the whole
    /// identifier when it has no `@`. `None` when nothing usable is left.
    pub fn action(&self) -> Option<&str> {
        let id = self.identifier()?;
        let action = match id.split_once('@') {
            Some((_, action)) => action,
            None => id,
        };
        (!action.is_empty()).then_some(action)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(_) => f.write_str("Handler::Inline"),
            Self::InlineAsync(_) => f.write_str("Handler::InlineAsync"),
            Self::Named(id) => f.debug_tuple("Handler::Named").field(id).finish(),
        }
    }
}

impl From<&str> for Handler {
    fn from(identifier: &str) -> Self {
        Self::named(identifier)
    }
}

impl From<String> for Handler {
    fn from(identifier: String) -> Self {
        Self::Named(identifier)
    }
}

/// Maps handler identifiers to callables.
pub trait HandlerResolver: Send + Sync {
    fn resolve(&self, identifier: &str) -> Option<Handler>;
}

/// A fixed identifier → handler table.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an inline handler under `identifier`. Named handlers are
    /// ignored since they would resolve to themselves.
    pub fn register(&mut self, identifier: impl Into<String>, handler: Handler) -> &mut Self {
        if !matches!(handler, Handler::Named(_)) {
            self.handlers.insert(identifier.into(), handler);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl HandlerResolver for HandlerRegistry {
    fn resolve(&self, identifier: &str) -> Option<Handler> {
        self.handlers.get(identifier).cloned()
    }
}
