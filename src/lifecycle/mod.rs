//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Boot cycles (provider.rs):
//!     serverInit   → compile routes → route table → dispatcher
//!     bootServer   → bind listener → spawn HTTP server
//!     serverBooted → log address and public URL
//!     stopServer   → trigger close hook → drain → join server task
//!
//! Startup (startup.rs):
//!     metrics exporter → init → boot → wait for signal or trigger
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger Shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: routes first, then listener
//! - One close hook (`Shutdown`) shared by every task that must stop

pub mod provider;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use provider::{BootError, HttpServerProvider, BOOT_CYCLES};
pub use shutdown::Shutdown;
