//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext (method, path)
//!     → table.rs
//!         1. exact map  "<METHOD> path", then "ALL path"
//!         2. hit cache  path → {route key, params}
//!         3. miss cache "<METHOD> path" → not found
//!         4. scan parameterized routes in order, fill a cache
//!     → dispatcher.rs
//!         Found    → bind params → invoke handler → ensure a response
//!         NotFound → fixed 404 body
//! ```
//!
//! # Design Decisions
//! - Exact map and pattern list are immutable after boot
//! - Caches are LRU and TTL bounded, guarded by a mutex
//! - Handler failures (errors and panics) stop at the dispatcher

pub mod cache;
pub mod dispatcher;
pub mod table;

pub use cache::BoundedCache;
pub use dispatcher::{DispatchOutcome, Dispatcher, ErrorReporter, HandlerFailure, TracingReporter};
pub use table::{CachedMatch, MatchSource, PathHits, Resolution, RouteTable};
