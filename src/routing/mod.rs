//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Declaration (at startup):
//!     builder.rs (Router: verbs, groups, shorthands)
//!     → route.rs / group.rs (declared tree)
//!     → compiler.rs (depth-first flatten, join prefixes)
//!     → path.rs / matcher.rs (regex for parameterized paths)
//!     → CompiledRoutes (ordered, immutable)
//!
//! Handler Resolution (per request):
//!     CompiledRoute.handler
//!     → inline callable, or
//!     → handler.rs (HandlerResolver: identifier → callable)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Literal paths never touch a regex
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod builder;
pub mod compiler;
pub mod error;
pub mod group;
pub mod handler;
pub mod matcher;
pub mod path;
pub mod route;

pub use builder::{ManyRoute, Router, Slot};
pub use compiler::{CompiledRoute, CompiledRoutes, RouteSummary};
pub use error::RouteError;
pub use group::{PathGroup, RouteEntry};
pub use handler::{BoxError, Handler, HandlerRegistry, HandlerResolver, HandlerResult};
pub use matcher::{Params, PathMatcher};
pub use path::RoutePath;
pub use route::{Route, ALL_METHODS};
