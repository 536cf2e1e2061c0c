//! Server, router and dispatch configuration.
//!
//! # Data Flow
//! ```text
//! TOML text or file
//!     → loader.rs (toml → AppConfig)
//!     → validation.rs (collects every semantic error)
//!     → AppConfig, copied into the builder, route table and server at boot
//! ```
//!
//! # Design Decisions
//! - Nothing re-reads config after boot
//! - Every section has defaults; an empty file is a valid config

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AppConfig, DispatchConfig, ObservabilityConfig, PathCase, RouterConfig, ServerConfig};
pub use validation::{validate_config, ValidationError};
