//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, cache TTLs > 0 for enabled caches)
//! - Check address and URL shapes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("server.protocol must be \"http\" or \"https\", got `{0}`")]
    Protocol(String),

    #[error("server.root must end with `/`, got `{0}`")]
    Root(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    RequestTimeout,

    #[error("{0} must be greater than zero when its cache is enabled")]
    CacheTtl(&'static str),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let server = &config.server;

    if server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(server.bind_address.clone()));
    }
    if server.protocol != "http" && server.protocol != "https" {
        errors.push(ValidationError::Protocol(server.protocol.clone()));
    }
    if !server.root.ends_with('/') {
        errors.push(ValidationError::Root(server.root.clone()));
    }
    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    let dispatch = &config.dispatch;
    if dispatch.routes_cache_size > 0 && dispatch.routes_cache_ttl_secs == 0 {
        errors.push(ValidationError::CacheTtl("dispatch.routes_cache_ttl_secs"));
    }
    if dispatch.not_found_cache_size > 0 && dispatch.not_found_cache_ttl_secs == 0 {
        errors.push(ValidationError::CacheTtl("dispatch.not_found_cache_ttl_secs"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.server.bind_address = "nowhere".into();
        config.server.root = "/app".into();
        config.dispatch.routes_cache_ttl_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("nowhere".into()),
                ValidationError::Root("/app".into()),
                ValidationError::CacheTtl("dispatch.routes_cache_ttl_secs"),
            ]
        );
    }

    #[test]
    fn test_disabled_cache_may_have_zero_ttl() {
        let mut config = AppConfig::default();
        config.dispatch.not_found_cache_size = 0;
        config.dispatch.not_found_cache_ttl_secs = 0;
        assert!(validate_config(&config).is_ok());
    }
}
