//! Response values and fixed responses.
//!
//! # Responsibilities
//! - Represent what a handler returns
//! - Encode replies into body bytes plus a content type
//! - Hold the pre-built not-found and failure responses
//!
//! # Design Decisions
//! - The 404 body is a static buffer shared by every unmatched request
//! - A returned reply is only sent when the handler has not responded
//!   itself; `Reply::Empty` then ends the response with no body

use axum::body::Bytes;
use axum::http::StatusCode;

/// Body served for every unmatched request.
pub static NOT_FOUND_BODY: Bytes = Bytes::from_static(b"Not Found!");

/// Body served when a handler fails before responding.
pub static SERVER_ERROR_BODY: Bytes = Bytes::from_static(b"Internal Server Error");

pub const NOT_FOUND_STATUS: StatusCode = StatusCode::NOT_FOUND;

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// A handler's return value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Reply {
    /// Nothing to send.
    #[default]
    Empty,
    Text(String),
    Json(serde_json::Value),
    Bytes(Bytes),
}

impl Reply {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<serde_json::Value> for Reply {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<Bytes> for Reply {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Reply {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}
