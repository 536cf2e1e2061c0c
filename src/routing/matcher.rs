//! Request path matching for parameterized routes.
//!
//! # Responsibilities
//! - Test a request path against a compiled route pattern
//! - Extract named parameters from the match
//!
//! # Design Decisions
//! - One anchored regex per route, built once at compile time
//! - Parameter names cached in capture order so extraction never re-parses
//! - Literal routes never get a matcher; they live in the exact map

use regex::Regex;
use std::collections::HashMap;

/// Path parameters extracted from a request path, keyed by parameter name.
pub type Params = HashMap<String, String>;

/// Predicate plus named-capture extraction for a parameterized path.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
    params: Vec<String>,
}

impl PathMatcher {
    pub(crate) fn new(regex: Regex) -> Self {
        let params = regex.capture_names().flatten().map(str::to_string).collect();
        Self { regex, params }
    }

    /// Parameter names in left-to-right order.
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Extract parameters if `path` matches.
    pub fn extract(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;
        Some(
            self.params
                .iter()
                .filter_map(|name| caps.name(name).map(|m| (name.clone(), m.as_str().to_string())))
                .collect(),
        )
    }
}
