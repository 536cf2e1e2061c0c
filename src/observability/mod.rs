//! Logging and metrics.
//!
//! # Data Flow
//! ```text
//! route table, dispatcher, provider
//!     → logging.rs (tracing events, filtered by RUST_LOG or config)
//!     → metrics.rs (dispatch outcomes, cache lookups, pattern scans)
//!
//! Sinks:
//!     → stdout
//!     → optional Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Dispatch log lines carry the request id of the context
//! - Recording functions are free functions so call sites stay one line

pub mod logging;
pub mod metrics;
