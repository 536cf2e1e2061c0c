//! Route path values and the matchers compiled from them.
//!
//! # Responsibilities
//! - Represent a path as a literal (with optional `:name` segments) or a regex
//! - Join group prefixes with child segments
//! - Produce the regex a parameterized path compiles to
//!
//! # Design Decisions
//! - Literal and regex paths are distinct variants, never sniffed at runtime
//! - A literal `:name` segment matches one path segment (`[^/]+`)
//! - Literal paths tolerate a single trailing slash; regex paths do not
//! - Regex anchors (`^`, `$`) are stripped before joining and re-applied once

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::routing::matcher::PathMatcher;

static NAMED_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":([A-Za-z0-9_]+)").expect("named segment regex is valid")
});

/// The path of a route or group prefix.
#[derive(Debug, Clone)]
pub enum RoutePath {
    /// A literal path, possibly containing `:name` segments.
    Literal(String),
    /// A regular expression; named capture groups become parameters.
    Pattern { regex: Regex, source: String },
}

impl RoutePath {
    /// Wrap a compiled regex.
    pub fn pattern(regex: Regex) -> Self {
        let source = regex.as_str().to_string();
        Self::Pattern { regex, source }
    }

    /// The textual form used for concatenation and route keys.
    pub fn source(&self) -> &str {
        match self {
            Self::Literal(path) => path,
            Self::Pattern { source, .. } => source,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern { .. })
    }

    /// Names of the `:name` segments (literal) or named captures (pattern), in order.
    pub fn param_names(&self) -> Vec<String> {
        match self {
            Self::Literal(path) => literal_param_names(path),
            Self::Pattern { regex, .. } => regex.capture_names().flatten().map(str::to_string).collect(),
        }
    }
}

impl Default for RoutePath {
    fn default() -> Self {
        Self::Literal(String::new())
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        Self::Literal(path.to_string())
    }
}

impl From<String> for RoutePath {
    fn from(path: String) -> Self {
        Self::Literal(path)
    }
}

impl From<Regex> for RoutePath {
    fn from(regex: Regex) -> Self {
        Self::pattern(regex)
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source())
    }
}

fn literal_param_names(path: &str) -> Vec<String> {
    NAMED_SEGMENT
        .captures_iter(path)
        .map(|c| c[1].to_string())
        .collect()
}

/// Translate a literal path into a regex fragment: escaped text plus one
/// named group per `:name` segment.
fn literal_fragment(path: &str) -> String {
    let mut fragment = String::with_capacity(path.len() + 16);
    let mut last = 0;
    for caps in NAMED_SEGMENT.captures_iter(path) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        fragment.push_str(&regex::escape(&path[last..whole.start]));
        fragment.push_str("(?P<");
        fragment.push_str(&caps[1]);
        fragment.push_str(">[^/]+?)");
        last = whole.end;
    }
    fragment.push_str(&regex::escape(&path[last..]));
    fragment
}

fn strip_anchors(source: &str) -> &str {
    let source = source.strip_prefix('^').unwrap_or(source);
    if source.ends_with('$') && !source.ends_with("\\$") {
        &source[..source.len() - 1]
    } else {
        source
    }
}

/// A path accumulated while walking down a group tree.
///
/// `source` is the display form; `fragment` is the equivalent regex body.
#[derive(Debug, Clone, Default)]
pub(crate) struct JoinedPath {
    source: String,
    fragment: String,
    has_pattern: bool,
}

impl JoinedPath {
    /// Append a child segment using the group concatenation rules.
    pub(crate) fn join(&self, segment: &RoutePath) -> Self {
        let (child, child_fragment) = match segment {
            RoutePath::Literal(path) => (path.as_str(), literal_fragment(path)),
            RoutePath::Pattern { source, .. } => {
                let stripped = strip_anchors(source);
                (stripped, stripped.to_string())
            }
        };

        let mut joined = self.clone();
        joined.has_pattern |= segment.is_pattern();

        // A child of exactly "/" would leave "/api/" artifacts.
        if child.is_empty() || child == "/" {
            return joined;
        }

        if child.starts_with('/') {
            if joined.source.ends_with('/') {
                joined.source.pop();
            }
            if joined.fragment.ends_with('/') {
                joined.fragment.pop();
            }
        } else {
            joined.source.push('/');
            joined.fragment.push('/');
        }

        joined.source.push_str(child);
        joined.fragment.push_str(&child_fragment);
        joined
    }

    /// The normalized, fully-qualified path. An empty path is the root.
    pub(crate) fn path(&self) -> String {
        if self.source.is_empty() {
            "/".to_string()
        } else {
            self.source.clone()
        }
    }

    /// Build a matcher when the path has parameters or a regex component.
    pub(crate) fn matcher(&self) -> Result<Option<PathMatcher>, regex::Error> {
        if !self.has_pattern && !NAMED_SEGMENT.is_match(&self.source) {
            return Ok(None);
        }

        let fragment = if self.fragment.is_empty() { "/" } else { &self.fragment };
        let pattern = if self.has_pattern {
            format!("^(?:{fragment})$")
        } else {
            format!("^{fragment}/?$")
        };

        Ok(Some(PathMatcher::new(Regex::new(&pattern)?)))
    }
}
