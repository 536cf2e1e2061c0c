//! Per-request context handed to handlers.
//!
//! # Responsibilities
//! - Lazy, memoized access to path params, query and body
//! - Request/response header access through a typed selector
//! - Response primitives (`send`, `json`, `redirect`, `status`)
//!
//! # Design Decisions
//! - Cheap to clone: all state lives behind one `Arc`
//! - Each parse function runs at most once per request
//! - The body stream is only read when `use_body` is called, and only for
//!   JSON content types
//! - The first write wins; later writes are no-ops

use axum::body::Bytes;
use axum::http::header::{CONTENT_TYPE, LOCATION, REFERER};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use uuid::Uuid;

use crate::http::response::{Reply, APPLICATION_JSON, TEXT_PLAIN};
use crate::http::transport::{BodySource, Inbound, ResponseSink};
use crate::routing::matcher::Params;

/// Parsed query string. Repeated keys collect into an array.
pub type Query = Map<String, Value>;

/// Parses the raw query string (without `?`).
pub type QueryParser = fn(Option<&str>) -> Query;

/// Parses a JSON request body that has been read in full.
pub type BodyParser = fn(&Bytes) -> Value;

/// Errors surfaced to handlers by the context.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Body is not an object!")]
    BodyNotObject,

    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Selects the inbound or outbound header namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Request,
    Response,
}

/// Parse functions injected into every context.
#[derive(Debug, Clone, Copy)]
pub struct Parsers {
    pub query: QueryParser,
    pub body: BodyParser,
}

impl Default for Parsers {
    fn default() -> Self {
        Self {
            query: parse_query,
            body: parse_json_body,
        }
    }
}

/// Default query parser.
pub fn parse_query(raw: Option<&str>) -> Query {
    let mut query = Query::new();
    let Some(raw) = raw else {
        return query;
    };

    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        let value = Value::String(value.into_owned());
        if let Some(existing) = query.get_mut(&*key) {
            match existing {
                Value::Array(values) => values.push(value),
                other => {
                    let first = other.take();
                    *other = Value::Array(vec![first, value]);
                }
            }
            continue;
        }
        query.insert(key.into_owned(), value);
    }
    query
}

/// Default body parser. Invalid JSON and `null` become an empty object.
pub fn parse_json_body(bytes: &Bytes) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Null) | Err(_) => Value::Object(Map::new()),
        Ok(value) => value,
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(APPLICATION_JSON))
}

struct Inner {
    id: Uuid,
    method: String,
    path: String,
    raw_query: Option<String>,
    headers: RwLock<HeaderMap>,
    body_source: Mutex<Option<Box<dyn BodySource>>>,
    parsers: Parsers,
    params: OnceLock<Params>,
    query: OnceLock<Query>,
    body: tokio::sync::OnceCell<Value>,
    sink: Arc<dyn ResponseSink>,
    responded: AtomicBool,
}

/// Per-request facade over the transport.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<Inner>,
}

impl RequestContext {
    pub fn new(inbound: Inbound, sink: Arc<dyn ResponseSink>) -> Self {
        Self::with_parsers(inbound, sink, Parsers::default())
    }

    pub fn with_parsers(inbound: Inbound, sink: Arc<dyn ResponseSink>, parsers: Parsers) -> Self {
        let Inbound {
            method,
            uri,
            headers,
            body,
        } = inbound;

        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                method: method.as_str().to_ascii_uppercase(),
                path: uri.path().to_string(),
                raw_query: uri.query().map(str::to_string),
                headers: RwLock::new(headers),
                body_source: Mutex::new(body),
                parsers,
                params: OnceLock::new(),
                query: OnceLock::new(),
                body: tokio::sync::OnceCell::new(),
                sink,
                responded: AtomicBool::new(false),
            }),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.inner.id
    }

    /// Uppercased request method.
    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn raw_query(&self) -> Option<&str> {
        self.inner.raw_query.as_deref()
    }

    /// Whether a response has been written.
    pub fn responded(&self) -> bool {
        self.inner.responded.load(Ordering::Acquire)
    }

    // --- Params ---

    /// Attach the params extracted by the dispatcher. Only the first call counts.
    pub(crate) fn bind_params(&self, params: Params) {
        let _ = self.inner.params.set(params);
    }

    pub fn use_params(&self) -> &Params {
        self.inner.params.get_or_init(Params::new)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.use_params().get(key).map(String::as_str)
    }

    pub fn param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.param(key).unwrap_or(default)
    }

    pub fn has_param(&self, key: &str) -> bool {
        self.use_params().contains_key(key)
    }

    // --- Query ---

    pub fn use_query(&self) -> &Query {
        self.inner
            .query
            .get_or_init(|| (self.inner.parsers.query)(self.inner.raw_query.as_deref()))
    }

    pub fn query(&self, key: &str) -> Option<&Value> {
        self.use_query().get(key)
    }

    pub fn query_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.query(key).unwrap_or(default)
    }

    pub fn has_query(&self, key: &str) -> bool {
        self.use_query().contains_key(key)
    }

    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, ContextError> {
        serde_json::from_value(Value::Object(self.use_query().clone()))
            .map_err(|source| ContextError::Decode { what: "query", source })
    }

    // --- Body ---

    /// Read and parse the body on first call. Non-JSON requests and failed
    /// reads resolve to an empty object.
    pub async fn use_body(&self) -> &Value {
        self.inner
            .body
            .get_or_init(|| async {
                let json = is_json(&self.inner.headers.read());
                if !json {
                    return Value::Object(Map::new());
                }

                let source = self.inner.body_source.lock().take();
                let Some(source) = source else {
                    return Value::Object(Map::new());
                };

                match source.read_all().await {
                    Ok(bytes) => (self.inner.parsers.body)(&bytes),
                    Err(e) => {
                        tracing::debug!(request_id = %self.inner.id, error = %e, "Body read failed");
                        Value::Object(Map::new())
                    }
                }
            })
            .await
    }

    /// Look up a top-level body field.
    pub async fn body(&self, key: &str) -> Result<Option<&Value>, ContextError> {
        match self.use_body().await {
            Value::Object(map) => Ok(map.get(key)),
            _ => Err(ContextError::BodyNotObject),
        }
    }

    /// Like [`RequestContext::body`], falling back to `default` for missing
    /// keys and non-object bodies.
    pub async fn body_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.body(key).await.ok().flatten().unwrap_or(default)
    }

    pub async fn body_as<T: DeserializeOwned>(&self) -> Result<T, ContextError> {
        serde_json::from_value(self.use_body().await.clone())
            .map_err(|source| ContextError::Decode { what: "body", source })
    }

    // --- Headers ---

    pub fn header(&self, kind: HeaderKind, name: &str) -> Option<String> {
        let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
        let value = match kind {
            HeaderKind::Request => self.inner.headers.read().get(&name).cloned(),
            HeaderKind::Response => self.inner.sink.header(&name),
        };
        value.and_then(|v| v.to_str().ok().map(str::to_string))
    }

    pub fn set_header(&self, kind: HeaderKind, name: &str, value: &str) -> Result<&Self, ContextError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ContextError::InvalidHeader(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ContextError::InvalidHeader(name.as_str().to_string()))?;

        match kind {
            HeaderKind::Request => {
                self.inner.headers.write().insert(name, value);
            }
            HeaderKind::Response => self.inner.sink.set_header(name, value),
        }
        Ok(self)
    }

    pub fn request_header(&self, name: &str) -> Option<String> {
        self.header(HeaderKind::Request, name)
    }

    pub fn response_header(&self, name: &str) -> Option<String> {
        self.header(HeaderKind::Response, name)
    }

    pub fn set_response_header(&self, name: &str, value: &str) -> Result<&Self, ContextError> {
        self.set_header(HeaderKind::Response, name, value)
    }

    // --- Responding ---

    pub fn status(&self, status: StatusCode) -> &Self {
        if !self.responded() {
            self.inner.sink.set_status(status);
        }
        self
    }

    /// Claim the response. Returns false if something was already sent.
    fn begin(&self) -> bool {
        let first = !self.inner.responded.swap(true, Ordering::AcqRel);
        if !first {
            tracing::debug!(request_id = %self.inner.id, path = %self.inner.path, "Response already sent, ignoring write");
        }
        first
    }

    fn default_content_type(&self, content_type: &'static str) {
        if self.inner.sink.header(&CONTENT_TYPE).is_none() {
            self.inner
                .sink
                .set_header(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
    }

    /// Send a reply. Returns whether this call wrote the response.
    pub fn send(&self, reply: impl Into<Reply>) -> bool {
        let body = match reply.into() {
            Reply::Json(value) => {
                return match self.json(&value) {
                    Ok(sent) => sent,
                    Err(e) => {
                        tracing::debug!(request_id = %self.inner.id, error = %e, "JSON reply not sent");
                        false
                    }
                };
            }
            Reply::Empty => Bytes::new(),
            Reply::Text(text) => {
                if !self.begin() {
                    return false;
                }
                self.default_content_type(TEXT_PLAIN);
                self.inner.sink.write(Bytes::from(text));
                return true;
            }
            Reply::Bytes(bytes) => bytes,
        };

        if !self.begin() {
            return false;
        }
        self.inner.sink.write(body);
        true
    }

    /// Serialize `value` as JSON and send it.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<bool, ContextError> {
        let body = serde_json::to_vec(value).map_err(ContextError::Encode)?;
        if !self.begin() {
            return Ok(false);
        }

        if let Err(body) = self.inner.sink.write_json(Bytes::from(body)) {
            self.default_content_type(APPLICATION_JSON);
            self.inner.sink.write(body);
        }
        Ok(true)
    }

    pub fn redirect(&self, url: &str) -> Result<bool, ContextError> {
        let location = HeaderValue::from_str(url).map_err(|_| ContextError::InvalidHeader(url.to_string()))?;
        if !self.begin() {
            return Ok(false);
        }

        self.inner.sink.set_status(StatusCode::FOUND);
        self.inner.sink.set_header(LOCATION, location);
        self.inner.sink.write(Bytes::new());
        Ok(true)
    }

    /// Redirect to the `referer` header, or `/` when absent.
    pub fn redirect_back(&self) -> Result<bool, ContextError> {
        let target = self
            .inner
            .headers
            .read()
            .get(REFERER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| "/".to_string());
        self.redirect(&target)
    }

    /// Write `body` with `status` unless a response already went out.
    pub(crate) fn respond_with(&self, status: StatusCode, body: Bytes) -> bool {
        if !self.begin() {
            return false;
        }
        self.inner.sink.set_status(status);
        self.default_content_type(TEXT_PLAIN);
        self.inner.sink.write(body);
        true
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("id", &self.inner.id)
            .field("method", &self.inner.method)
            .field("path", &self.inner.path)
            .field("responded", &self.responded())
            .finish()
    }
}
