//! Route nodes: one endpoint each.

use crate::routing::error::RouteError;
use crate::routing::handler::Handler;
use crate::routing::path::RoutePath;

/// Method used by `all`/`any` routes; matches every request method.
pub const ALL_METHODS: &str = "ALL";

/// A single declared endpoint.
///
/// Created by the verb methods on [`Router`](crate::routing::Router). After
/// creation only the name and the handler identifier may change, through the
/// fluent calls below.
#[derive(Debug, Clone)]
pub struct Route {
    method: String,
    path: RoutePath,
    handler: Option<Handler>,
    name: Option<String>,
    namespace: Option<String>,
}

impl Route {
    pub fn new(method: &str, path: impl Into<RoutePath>, handler: Option<Handler>) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.into(),
            handler,
            name: None,
            namespace: None,
        }
    }

    pub(crate) fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Set the route name.
    pub fn named(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Point the route at a handler identifier, qualified with the
    /// builder namespace when there is one.
    pub fn controller(&mut self, identifier: &str) -> &mut Self {
        let identifier = match &self.namespace {
            Some(ns) => format!("{ns}::{identifier}"),
            None => identifier.to_string(),
        };
        self.handler = Some(Handler::Named(identifier));
        self
    }

    /// Name the route after the action part of its handler identifier.
    ///
    /// Inline handlers have no identifier and are left unnamed.
    pub fn action_as_name(&mut self) -> Result<&mut Self, RouteError> {
        let Some(handler) = &self.handler else {
            return Err(self.missing_action());
        };
        if !matches!(handler, Handler::Named(_)) {
            return Ok(self);
        }

        match handler.action().map(str::to_string) {
            Some(action) => {
                self.name = Some(action);
                Ok(self)
            }
            None => Err(self.missing_action()),
        }
    }

    pub(crate) fn missing_action(&self) -> RouteError {
        RouteError::MissingAction {
            method: self.method.clone(),
            path: self.path.source().to_string(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &RoutePath {
        &self.path
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Parameter names declared by this node's own path.
    pub fn param_names(&self) -> Vec<String> {
        self.path.param_names()
    }

    pub fn is_async(&self) -> bool {
        self.handler.as_ref().is_some_and(Handler::is_async)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::Reply;

    #[test]
    fn test_method_is_uppercased() {
        let route = Route::new("get", "/users/:id", None);
        assert_eq!(route.method(), "GET");
        assert_eq!(route.param_names(), ["id"]);
        assert!(!route.is_async());
    }

    #[test]
    fn test_controller_is_namespaced() {
        let mut route = Route::new("GET", "/", None).with_namespace(Some("Admin".into()));
        route.controller("Users@index");
        assert_eq!(route.handler().and_then(Handler::identifier), Some("Admin::Users@index"));
    }

    #[test]
    fn test_action_as_name() {
        let mut route = Route::new("GET", "/", Some(Handler::named("Users@index")));
        route.action_as_name().unwrap();
        assert_eq!(route.name(), Some("index"));

        let mut route = Route::new("GET", "/", Some(Handler::named("about")));
        route.action_as_name().unwrap();
        assert_eq!(route.name(), Some("about"));
    }

    #[test]
    fn test_action_as_name_without_handler_fails() {
        let mut route = Route::new("POST", "/x", None);
        let err = route.action_as_name().unwrap_err();
        assert!(matches!(err, RouteError::MissingAction { ref method, .. } if method == "POST"));
    }

    #[test]
    fn test_inline_handler_keeps_no_name() {
        let mut route = Route::new("GET", "/", Some(Handler::from_fn(|_| Ok(Reply::Empty))));
        route.action_as_name().unwrap();
        assert_eq!(route.name(), None);
    }
}
