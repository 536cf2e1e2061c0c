//! Transport collaborator contracts.
//!
//! # Responsibilities
//! - Describe what a listener hands the core per request ([`Inbound`])
//! - Describe how the core writes back ([`ResponseSink`])
//! - Provide the buffered sink and axum body source used by the bundled server
//!
//! # Design Decisions
//! - The body is a one-shot source read only when a handler asks for it
//! - Header writes go straight to the sink, nothing is buffered in the context
//! - `write` both sends the body and completes the response

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;

use crate::routing::handler::BoxError;

/// A request body that can be read once.
pub trait BodySource: Send {
    fn read_all(self: Box<Self>) -> BoxFuture<'static, Result<Bytes, BoxError>>;
}

/// The writable half of a request, owned by the transport.
pub trait ResponseSink: Send + Sync {
    fn set_status(&self, status: StatusCode);

    fn status(&self) -> StatusCode;

    fn set_header(&self, name: HeaderName, value: HeaderValue);

    fn header(&self, name: &HeaderName) -> Option<HeaderValue>;

    /// Send `body` and complete the response.
    fn write(&self, body: Bytes);

    /// Transport-specific JSON responder. Hands the body back when the
    /// transport has none, in which case the caller falls back to `write`.
    fn write_json(&self, body: Bytes) -> Result<(), Bytes> {
        Err(body)
    }
}

/// Everything the transport supplies for one request.
pub struct Inbound {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Option<Box<dyn BodySource>>,
}

impl Inbound {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl BodySource + 'static) -> Self {
        self.body = Some(Box::new(body));
        self
    }
}

/// Reads an axum body, bounded by `limit` bytes.
pub struct AxumBody {
    body: Body,
    limit: usize,
}

impl AxumBody {
    pub fn new(body: Body, limit: usize) -> Self {
        Self { body, limit }
    }
}

impl BodySource for AxumBody {
    fn read_all(self: Box<Self>) -> BoxFuture<'static, Result<Bytes, BoxError>> {
        let AxumBody { body, limit } = *self;
        Box::pin(async move { axum::body::to_bytes(body, limit).await.map_err(BoxError::from) })
    }
}

#[derive(Debug)]
struct ResponseParts {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
    writes: usize,
}

/// A sink that collects the response in memory until the handler is done.
#[derive(Debug)]
pub struct BufferedResponse {
    parts: Mutex<ResponseParts>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self {
            parts: Mutex::new(ResponseParts {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: None,
                writes: 0,
            }),
        }
    }

    /// Number of times `write` or `write_json` reached this sink.
    pub fn write_count(&self) -> usize {
        self.parts.lock().writes
    }

    pub fn is_complete(&self) -> bool {
        self.parts.lock().body.is_some()
    }

    pub fn body(&self) -> Option<Bytes> {
        self.parts.lock().body.clone()
    }

    /// Assemble the collected parts into an axum response.
    pub fn to_response(&self) -> Response {
        let parts = self.parts.lock();
        let mut response = Response::new(Body::from(parts.body.clone().unwrap_or_default()));
        *response.status_mut() = parts.status;
        *response.headers_mut() = parts.headers.clone();
        response
    }
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&self, status: StatusCode) {
        self.parts.lock().status = status;
    }

    fn status(&self) -> StatusCode {
        self.parts.lock().status
    }

    fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.parts.lock().headers.insert(name, value);
    }

    fn header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.parts.lock().headers.get(name).cloned()
    }

    fn write(&self, body: Bytes) {
        let mut parts = self.parts.lock();
        parts.writes += 1;
        parts.body = Some(body);
    }
}
