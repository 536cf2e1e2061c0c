//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Application name, used in the startup log.
    pub name: String,

    /// Environment name (e.g., "development", "production").
    pub env: String,

    /// Listener and URL settings.
    pub server: ServerConfig,

    /// Route builder settings.
    pub router: RouterConfig,

    /// Dispatcher cache settings.
    pub dispatch: DispatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// Listener and URL configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:2000").
    pub bind_address: String,

    /// Public protocol used when building URLs ("http" or "https").
    pub protocol: String,

    /// Public domain used when building URLs.
    pub domain: String,

    /// Public port used when building URLs.
    pub port: u16,

    /// Root folder, must end with a trailing slash.
    pub root: String,

    /// Append the port to built URLs (ignored for 80 and 443).
    pub include_port_in_url: bool,

    /// Overrides protocol/domain/port/root when non-empty.
    pub base_url: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:2000".to_string(),
            protocol: "http".to_string(),
            domain: "localhost".to_string(),
            port: 2000,
            root: "/".to_string(),
            include_port_in_url: true,
            base_url: String::new(),
            request_timeout_secs: 30,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

impl ServerConfig {
    /// Base of every URL built by [`ServerConfig::url`], always ending in `/`.
    pub fn base_url(&self) -> String {
        if !self.base_url.is_empty() {
            let mut base = self.base_url.clone();
            if !base.ends_with('/') {
                base.push('/');
            }
            return base;
        }

        let mut base = format!("{}://{}", self.protocol, self.domain);
        if self.include_port_in_url && self.port != 80 && self.port != 443 {
            base.push_str(&format!(":{}", self.port));
        }
        if !self.root.starts_with('/') {
            base.push('/');
        }
        base.push_str(&self.root);
        if !base.ends_with('/') {
            base.push('/');
        }
        base
    }

    /// Absolute URL for `path`, with `query` pairs appended when present.
    pub fn url<K, V>(&self, path: &str, query: &[(K, V)]) -> String
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = self.base_url();
        url.push_str(path.trim_start_matches('/'));

        if !query.is_empty() {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in query {
                serializer.append_pair(key.as_ref(), value.as_ref());
            }
            url.push('?');
            url.push_str(&serializer.finish());
        }
        url
    }
}

/// Case convention for paths derived from `@action` shorthands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathCase {
    #[default]
    Snake,
    Kebab,
}

/// Route builder configuration. Captured when a builder is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    pub path_case: PathCase,
}

/// Dispatcher cache configuration. A size of zero disables that cache.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Capacity of the matched-pattern cache.
    pub routes_cache_size: usize,

    /// Capacity of the not-found cache.
    pub not_found_cache_size: usize,

    /// Lifetime of matched-pattern entries in seconds.
    pub routes_cache_ttl_secs: u64,

    /// Lifetime of not-found entries in seconds.
    pub not_found_cache_ttl_secs: u64,
}

impl DispatchConfig {
    pub fn routes_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.routes_cache_ttl_secs)
    }

    pub fn not_found_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.not_found_cache_ttl_secs)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            routes_cache_size: 100_000,
            not_found_cache_size: 100_000,
            routes_cache_ttl_secs: 60 * 60,              // 1 hour
            not_found_cache_ttl_secs: 60 * 60 * 24 * 7, // 1 week
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
