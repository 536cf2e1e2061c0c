//! Route registration and request dispatch.
//!
//! Declare routes with [`Router`], compile them into a flat table, and serve
//! them through a [`Dispatcher`] behind an axum server.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::AppConfig;
pub use dispatch::Dispatcher;
pub use http::{HttpServer, Reply, RequestContext};
pub use lifecycle::{HttpServerProvider, Shutdown};
pub use routing::{Handler, HandlerRegistry, Router};
