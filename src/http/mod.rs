//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, single fallback handler)
//!     → transport.rs (request parts + lazy body source, buffered response sink)
//!     → context.rs (RequestContext handed to the dispatcher and handlers)
//!     → response.rs (replies, fixed 404/500 bodies)
//!     → Send to client
//! ```

pub mod context;
pub mod response;
pub mod server;
pub mod transport;

pub use context::{ContextError, HeaderKind, RequestContext};
pub use response::Reply;
pub use server::{HttpServer, X_REQUEST_ID};
pub use transport::{BodySource, BufferedResponse, Inbound, ResponseSink};
