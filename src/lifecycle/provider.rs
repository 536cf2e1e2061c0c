//! The HTTP server provider driven by a boot-cycle host.
//!
//! # Responsibilities
//! - Own the route builder until the routes are frozen
//! - `init`: compile routes, build the route table and dispatcher
//! - `boot`: bind the listener and start serving
//! - `stop`: fire the close hook and wait for the server to drain
//!
//! # Design Decisions
//! - Routes are compiled once; later builder changes need a new provider
//! - Bind failures surface as `BootError`, never retried

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::{AppConfig, ConfigError};
use crate::dispatch::{Dispatcher, ErrorReporter, RouteTable};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::routing::{HandlerRegistry, HandlerResolver, RouteError, Router};

/// Boot phases this provider takes part in, in order.
pub const BOOT_CYCLES: [&str; 4] = ["serverInit", "bootServer", "serverBooted", "stopServer"];

/// Error type for provider lifecycle steps.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Route compilation failed: {0}")]
    Compile(#[from] RouteError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Provider is not initialized")]
    NotInitialized,

    #[error("Server is already running")]
    AlreadyBooted,
}

/// Lifecycle wrapper around route compilation, dispatch and the HTTP server.
pub struct HttpServerProvider {
    config: AppConfig,
    router: Router,
    resolver: Arc<dyn HandlerResolver>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    dispatcher: Option<Arc<Dispatcher>>,
    shutdown: Shutdown,
    local_addr: Option<SocketAddr>,
    server: Option<JoinHandle<std::io::Result<()>>>,
}

impl HttpServerProvider {
    pub fn new(config: AppConfig) -> Self {
        let router = Router::with_config(config.router);
        Self {
            config,
            router,
            resolver: Arc::new(HandlerRegistry::new()),
            reporter: None,
            dispatcher: None,
            shutdown: Shutdown::new(),
            local_addr: None,
            server: None,
        }
    }

    /// Boot phases the host must run for this provider.
    pub fn custom_boot_cycles() -> &'static [&'static str] {
        &BOOT_CYCLES
    }

    /// Replace the declared routes.
    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HandlerResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Route builder; changes after [`HttpServerProvider::init`] are ignored.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// `serverInit`: compile routes and build the dispatcher.
    pub fn init(&mut self) -> Result<(), BootError> {
        if self.dispatcher.is_some() {
            return Ok(());
        }

        let routes = self.router.compile()?;
        let table = RouteTable::new(routes, &self.config.dispatch);
        tracing::info!(routes = table.len(), "Routes registered");

        let mut dispatcher = Dispatcher::new(table, self.resolver.clone());
        if let Some(reporter) = &self.reporter {
            dispatcher = dispatcher.with_reporter(reporter.clone());
        }
        self.dispatcher = Some(Arc::new(dispatcher));
        Ok(())
    }

    /// `bootServer` and `serverBooted`: bind and start serving in the background.
    pub async fn boot(&mut self) -> Result<SocketAddr, BootError> {
        if self.server.is_some() {
            return Err(BootError::AlreadyBooted);
        }
        let dispatcher = self.dispatcher.clone().ok_or(BootError::NotInitialized)?;

        let address = self.config.server.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| BootError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(BootError::Serve)?;

        let server = HttpServer::new(dispatcher, self.config.server.clone());
        let shutdown = self.shutdown.clone();
        self.server = Some(tokio::spawn(server.run(listener, shutdown)));
        self.local_addr = Some(local_addr);

        tracing::info!(
            name = %self.config.name,
            address = %local_addr,
            url = %self.url("", &[] as &[(&str, &str)]),
            "Server booted"
        );
        Ok(local_addr)
    }

    /// `stopServer`: fire the close hook and wait for the server task.
    pub async fn stop(&mut self) -> Result<(), BootError> {
        self.shutdown.trigger();
        self.wait().await
    }

    /// Wait for the server task to finish, e.g. after an external trigger.
    pub async fn wait(&mut self) -> Result<(), BootError> {
        match self.server.take() {
            Some(task) => task.await?.map_err(BootError::Serve),
            None => Ok(()),
        }
    }

    /// Close hook shared with the server; trigger it to stop serving.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn dispatcher(&self) -> Option<&Arc<Dispatcher>> {
        self.dispatcher.as_ref()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.server.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Absolute URL for `path` per the server config.
    pub fn url<K: AsRef<str>, V: AsRef<str>>(&self, path: &str, query: &[(K, V)]) -> String {
        self.config.server.url(path, query)
    }
}

impl std::fmt::Debug for HttpServerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServerProvider")
            .field("local_addr", &self.local_addr)
            .field("initialized", &self.dispatcher.is_some())
            .field("running", &self.is_running())
            .finish()
    }
}
