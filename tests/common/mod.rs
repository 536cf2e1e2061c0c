//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::Arc;

use route_dispatch::config::AppConfig;
use route_dispatch::routing::HandlerResolver;
use route_dispatch::{HandlerRegistry, HttpServerProvider, Router};

/// A booted server bound to an ephemeral local port.
pub struct TestServer {
    pub provider: HttpServerProvider,
    pub addr: SocketAddr,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(mut self) {
        self.provider.stop().await.unwrap();
    }
}

/// Config that binds to `127.0.0.1:0`.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.bind_address = "127.0.0.1:0".into();
    config
}

/// Boot `router` with an empty handler registry.
#[allow(dead_code)]
pub async fn start_server(router: Router) -> TestServer {
    start_server_with(router, HandlerRegistry::new(), test_config()).await
}

/// Boot `router` with the given resolver and config.
pub async fn start_server_with<R>(router: Router, resolver: R, config: AppConfig) -> TestServer
where
    R: HandlerResolver + 'static,
{
    let mut provider = HttpServerProvider::new(config)
        .with_router(router)
        .with_resolver(Arc::new(resolver));
    provider.init().unwrap();
    let addr = provider.boot().await.unwrap();
    TestServer { provider, addr }
}
