//! Route tree flattening.
//!
//! # Responsibilities
//! - Walk the declared tree depth-first, preserving sibling order
//! - Join group prefixes onto child paths
//! - Apply group controller bindings and name prefixes
//! - Build a matcher for every parameterized path
//!
//! # Design Decisions
//! - One compiled route per declared route, nothing merged or dropped
//! - Output order is the fallback scan order (first match wins)
//! - Duplicate keys are kept in the list; map projections keep the last one

use serde::Serialize;
use std::collections::HashMap;

use crate::routing::error::RouteError;
use crate::routing::group::{PathGroup, RouteEntry};
use crate::routing::handler::Handler;
use crate::routing::matcher::PathMatcher;
use crate::routing::path::JoinedPath;
use crate::routing::route::{Route, ALL_METHODS};

/// A fully-qualified route, ready for dispatch.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    method: String,
    path: String,
    handler: Option<Handler>,
    name: Option<String>,
    param_names: Vec<String>,
    matcher: Option<PathMatcher>,
}

impl CompiledRoute {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `"<METHOD> <path>"`.
    pub fn key(&self) -> String {
        route_key(&self.method, &self.path)
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Present for paths with `:name` segments or a regex component.
    pub fn matcher(&self) -> Option<&PathMatcher> {
        self.matcher.as_ref()
    }

    pub fn is_async(&self) -> bool {
        self.handler.as_ref().is_some_and(Handler::is_async)
    }

    /// True for the route's own method, and for every method on `ALL` routes.
    pub fn matches_method(&self, method: &str) -> bool {
        self.method == ALL_METHODS || self.method.eq_ignore_ascii_case(method)
    }
}

pub(crate) fn route_key(method: &str, path: &str) -> String {
    let mut key = String::with_capacity(method.len() + path.len() + 1);
    key.push_str(method);
    key.push(' ');
    key.push_str(path);
    key
}

/// Serializable view of a compiled route. Inline handlers are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    pub params: Vec<String>,
    pub is_async: bool,
}

impl From<&CompiledRoute> for RouteSummary {
    fn from(route: &CompiledRoute) -> Self {
        Self {
            method: route.method.clone(),
            path: route.path.clone(),
            name: route.name.clone(),
            controller: route.handler().and_then(Handler::identifier).map(str::to_string),
            params: route.param_names.clone(),
            is_async: route.is_async(),
        }
    }
}

/// The flat, ordered route list produced by [`compile`].
#[derive(Debug, Clone, Default)]
pub struct CompiledRoutes {
    routes: Vec<CompiledRoute>,
}

impl CompiledRoutes {
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledRoute> {
        self.routes.iter()
    }

    pub fn as_slice(&self) -> &[CompiledRoute] {
        &self.routes
    }

    pub fn into_vec(self) -> Vec<CompiledRoute> {
        self.routes
    }

    /// Every route by key. Later duplicates replace earlier ones.
    pub fn to_map(&self) -> HashMap<String, &CompiledRoute> {
        self.routes.iter().map(|route| (route.key(), route)).collect()
    }

    /// Routes without parameters by key, for exact lookups.
    pub fn exact_map(&self) -> HashMap<String, &CompiledRoute> {
        self.routes
            .iter()
            .filter(|route| route.matcher.is_none())
            .map(|route| (route.key(), route))
            .collect()
    }

    /// Route key to handler. Routes without a handler are left out.
    pub fn to_handler_map(&self) -> HashMap<String, &Handler> {
        self.routes
            .iter()
            .filter_map(|route| Some((route.key(), route.handler.as_ref()?)))
            .collect()
    }

    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.routes.iter().map(RouteSummary::from).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.summaries())
    }
}

impl<'a> IntoIterator for &'a CompiledRoutes {
    type Item = &'a CompiledRoute;
    type IntoIter = std::slice::Iter<'a, CompiledRoute>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

/// What a group passes down to its descendants.
#[derive(Debug, Clone, Default)]
struct Scope<'a> {
    path: JoinedPath,
    controller: Option<&'a str>,
    name_prefix: Option<String>,
    actions_as_name: bool,
}

impl<'a> Scope<'a> {
    fn enter(&self, group: &'a PathGroup) -> Self {
        let name_prefix = match (&self.name_prefix, group.name_prefix()) {
            (Some(outer), Some(inner)) => Some(format!("{outer}.{inner}")),
            (outer, inner) => inner.map(str::to_string).or_else(|| outer.clone()),
        };

        Self {
            path: self.path.join(group.prefix()),
            controller: group.controller_binding().or(self.controller),
            name_prefix,
            actions_as_name: self.actions_as_name || group.uses_actions_as_name(),
        }
    }
}

/// Flatten a route tree into its compiled, ordered form.
pub fn compile(entries: &[RouteEntry]) -> Result<CompiledRoutes, RouteError> {
    let mut routes = Vec::new();
    walk(entries, &Scope::default(), &mut routes)?;
    tracing::debug!(routes = routes.len(), "Routes compiled");
    Ok(CompiledRoutes { routes })
}

fn walk<'a>(entries: &'a [RouteEntry], scope: &Scope<'a>, out: &mut Vec<CompiledRoute>) -> Result<(), RouteError> {
    for entry in entries {
        match entry {
            RouteEntry::Route(route) => out.push(compile_route(route, scope)?),
            RouteEntry::Group(group) => walk(group.children(), &scope.enter(group), out)?,
        }
    }
    Ok(())
}

fn compile_route(route: &Route, scope: &Scope<'_>) -> Result<CompiledRoute, RouteError> {
    let joined = scope.path.join(route.path());
    let path = joined.path();

    let matcher = joined.matcher().map_err(|source| RouteError::InvalidPattern {
        method: route.method().to_string(),
        path: path.clone(),
        source,
    })?;

    let handler = match (route.handler(), scope.controller) {
        (Some(Handler::Named(action)), Some(controller)) if !action.contains('@') => {
            Some(Handler::Named(format!("{controller}@{action}")))
        }
        (handler, _) => handler.cloned(),
    };

    let mut name = route.name().map(str::to_string);
    if name.is_none() && scope.actions_as_name {
        name = match &handler {
            Some(handler @ Handler::Named(_)) => Some(
                handler
                    .action()
                    .map(str::to_string)
                    .ok_or_else(|| route.missing_action())?,
            ),
            Some(_) => None,
            None => return Err(route.missing_action()),
        };
    }
    if let (Some(prefix), Some(local)) = (&scope.name_prefix, &name) {
        name = Some(format!("{prefix}.{local}"));
    }

    let param_names = matcher
        .as_ref()
        .map(|m| m.param_names().to_vec())
        .unwrap_or_default();

    Ok(CompiledRoute {
        method: route.method().to_string(),
        path,
        handler,
        name,
        param_names,
        matcher,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Router;
    use regex::Regex;

    fn keys(routes: &CompiledRoutes) -> Vec<String> {
        routes.iter().map(CompiledRoute::key).collect()
    }

    fn eight_route_tree() -> Router {
        let mut router = Router::new();
        router.get("/", Handler::named("Home@index"));
        router.get("/about", Handler::named("Home@about"));
        router.path("/api", |api| {
            api.get("/", Handler::named("Api@index"));
            api.get("users", Handler::named("Api@users"));
            api.path("/user/:user", |user| {
                user.get("", Handler::named("User@show"));
                user.post("", Handler::named("User@update"));
                user.path("/posts", |posts| {
                    posts.get("", Handler::named("Posts@index"));
                    posts.post("", Handler::named("Posts@store"));
                });
            });
        });
        router
    }

    #[test]
    fn test_eight_route_tree() {
        let routes = eight_route_tree().compile().unwrap();

        assert_eq!(
            keys(&routes),
            [
                "GET /",
                "GET /about",
                "GET /api",
                "GET /api/users",
                "GET /api/user/:user",
                "POST /api/user/:user",
                "GET /api/user/:user/posts",
                "POST /api/user/:user/posts",
            ]
        );

        let show = &routes.as_slice()[4];
        assert_eq!(show.param_names(), ["user"]);
        assert_eq!(
            show.matcher().and_then(|m| m.extract("/api/user/7")).and_then(|p| p.get("user").cloned()),
            Some("7".to_string())
        );
        assert!(routes.as_slice()[3].matcher().is_none());
    }

    #[test]
    fn test_count_matches_declared_leaves() {
        let router = eight_route_tree();
        let routes = router.compile().unwrap();
        assert_eq!(routes.len(), router.route_count());
        assert_eq!(routes.len(), 8);
    }

    #[test]
    fn test_exact_map_skips_parameterized_routes() {
        let routes = eight_route_tree().compile().unwrap();
        let exact = routes.exact_map();
        assert_eq!(exact.len(), 4);
        assert!(exact.contains_key("GET /api/users"));
        assert!(!exact.contains_key("GET /api/user/:user"));
        assert_eq!(routes.to_map().len(), 8);
    }

    #[test]
    fn test_duplicate_key_last_registration_wins() {
        // Compatibility behavior: a repeated key silently replaces the earlier route.
        let mut router = Router::new();
        router.get("/x", Handler::named("First@run"));
        router.get("/x", Handler::named("Second@run"));

        let routes = router.compile().unwrap();
        assert_eq!(routes.len(), 2);

        let handlers = routes.to_handler_map();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers["GET /x"].identifier(), Some("Second@run"));
    }

    #[test]
    fn test_shorthand_route_compiles_under_root() {
        let mut router = Router::new();
        router.add_route("get", "@show_profile", None);

        let routes = router.compile().unwrap();
        let route = &routes.as_slice()[0];
        assert_eq!(route.path(), "/show_profile");
        assert_eq!(route.handler().and_then(Handler::identifier), Some("show_profile"));
    }

    #[test]
    fn test_regex_route() {
        let mut router = Router::new();
        router.path("/files", |files| {
            files.get(Regex::new(r"^/(?P<name>[a-z]+)\.txt$").unwrap(), None);
        });

        let routes = router.compile().unwrap();
        let route = &routes.as_slice()[0];
        assert_eq!(route.path(), r"/files/(?P<name>[a-z]+)\.txt");
        assert_eq!(route.param_names(), ["name"]);

        let matcher = route.matcher().unwrap();
        assert!(matcher.is_match("/files/notes.txt"));
        assert!(!matcher.is_match("/files/notes.md"));
    }

    #[test]
    fn test_invalid_pattern() {
        let mut router = Router::new();
        router.get("/a/:id/b/:id", None);
        assert!(matches!(router.compile(), Err(RouteError::InvalidPattern { .. })));
    }

    #[test]
    fn test_group_controller_and_names() {
        let mut router = Router::new().with_namespace("Admin");
        router
            .path("/users", |users| {
                users.get("", Handler::named("index"));
                users.get("/:id", Handler::named("Other@show")).named("details");
                users
                    .path("/settings", |settings| {
                        settings.get("", Handler::named("edit"));
                    })
                    .as_name("settings");
            })
            .controller("Users")
            .as_name("users")
            .actions_as_name();

        let routes = router.compile().unwrap();
        let summary: Vec<_> = routes
            .iter()
            .map(|r| (r.handler().and_then(Handler::identifier).unwrap_or_default(), r.name().unwrap_or_default()))
            .collect();

        assert_eq!(
            summary,
            [
                ("Admin::Users@index", "users.index"),
                ("Admin::Other@show", "users.details"),
                ("Admin::Users@edit", "users.settings.edit"),
            ]
        );
    }

    #[test]
    fn test_actions_as_name_requires_handler() {
        let mut router = Router::new();
        router
            .path("/x", |x| {
                x.get("/y", None);
            })
            .actions_as_name();

        assert!(matches!(router.compile(), Err(RouteError::MissingAction { .. })));
    }

    #[test]
    fn test_to_json_omits_inline_handlers() {
        let mut router = Router::new();
        router.get("/", Handler::from_fn(|_| Ok(crate::http::response::Reply::Empty)));
        router.get("/u/:id", Handler::named("Users@show")).named("user");

        let json: serde_json::Value = serde_json::from_str(&router.compile().unwrap().to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "method": "GET", "path": "/", "params": [], "is_async": false },
                { "method": "GET", "path": "/u/:id", "name": "user", "controller": "Users@show", "params": ["id"], "is_async": false },
            ])
        );
    }

    #[test]
    fn test_all_method_matches_everything() {
        let mut router = Router::new();
        router.all("/hook", None);
        let routes = router.compile().unwrap();
        let route = &routes.as_slice()[0];
        assert!(route.matches_method("GET"));
        assert!(route.matches_method("DELETE"));
    }
}
