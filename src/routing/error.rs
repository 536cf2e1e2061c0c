use thiserror::Error;

/// Errors raised while declaring or compiling routes.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A name was requested from the handler identifier, but there is none.
    #[error("route {method} `{path}` has no handler identifier to take an action name from")]
    MissingAction { method: String, path: String },

    /// The compiled path does not form a valid regular expression.
    #[error("route {method} `{path}` has an invalid pattern: {source}")]
    InvalidPattern {
        method: String,
        path: String,
        #[source]
        source: regex::Error,
    },
}
