//! Fluent route builder.
//!
//! # Responsibilities
//! - Accumulate routes and groups as a tree, in declaration order
//! - Expand `=id` and `@id` shorthand paths
//! - Qualify handler identifiers with the builder namespace
//!
//! # Design Decisions
//! - Groups are built by handing the callback a fresh sub-builder; the
//!   caller's buffer is never swapped out
//! - Config is copied in at construction and never re-read
//! - Nothing is validated until [`Router::compile`]

use heck::{ToKebabCase, ToSnakeCase};

use crate::config::schema::{PathCase, RouterConfig};
use crate::routing::compiler::{self, CompiledRoutes};
use crate::routing::error::RouteError;
use crate::routing::group::{PathGroup, RouteEntry};
use crate::routing::handler::Handler;
use crate::routing::path::RoutePath;
use crate::routing::route::Route;

/// Route declaration entry point.
#[derive(Debug, Clone, Default)]
pub struct Router {
    namespace: Option<String>,
    config: RouterConfig,
    routes: Vec<RouteEntry>,
}

macro_rules! verbs {
    ($($(#[$meta:meta])* $fn_name:ident => $method:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $fn_name(
                &mut self,
                path: impl Into<RoutePath>,
                handler: impl Into<Option<Handler>>,
            ) -> &mut Route {
                self.add_route($method, path, handler.into())
            }
        )*
    };
}

macro_rules! many_verbs {
    ($($fn_name:ident => $method:literal),* $(,)?) => {
        $(
            pub fn $fn_name<I>(&mut self, entries: I) -> Result<(), RouteError>
            where
                I: IntoIterator,
                I::Item: Into<ManyRoute>,
            {
                self.add_many_routes($method, entries)
            }
        )*
    };
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Handler identifiers registered from here on are qualified as `namespace::id`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn config(&self) -> RouterConfig {
        self.config
    }

    /// Top-level nodes in declaration order.
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    pub fn into_routes(self) -> Vec<RouteEntry> {
        self.routes
    }

    /// Total number of routes, counting those inside groups.
    pub fn route_count(&self) -> usize {
        self.routes.iter().map(RouteEntry::leaf_count).sum()
    }

    /// Register a route.
    ///
    /// Without a handler, a literal path starting with `=` names the handler
    /// and leaves the path empty, and one starting with `@` names the handler
    /// and derives the path from it in the configured case.
    pub fn add_route(
        &mut self,
        method: &str,
        path: impl Into<RoutePath>,
        handler: Option<Handler>,
    ) -> &mut Route {
        let mut path = path.into();
        let mut handler = handler;

        if handler.is_none() {
            if let Some((shorthand_path, identifier)) = self.expand_shorthand(&path) {
                path = shorthand_path;
                handler = Some(Handler::Named(identifier));
            }
        }

        if let (Some(ns), Some(Handler::Named(identifier))) = (&self.namespace, &mut handler) {
            if identifier.contains('@') && !identifier.contains("::") {
                *identifier = format!("{ns}::{identifier}");
            }
        }

        let route = Route::new(method, path, handler).with_namespace(self.namespace.clone());
        self.routes.push(RouteEntry::Route(route));
        match self.routes.last_mut() {
            Some(RouteEntry::Route(route)) => route,
            _ => unreachable!("a route was just pushed"),
        }
    }

    fn expand_shorthand(&self, path: &RoutePath) -> Option<(RoutePath, String)> {
        let RoutePath::Literal(text) = path else {
            return None;
        };

        if let Some(identifier) = text.strip_prefix('=') {
            return Some((RoutePath::default(), identifier.to_string()));
        }

        let identifier = text.strip_prefix('@')?;
        let derived = match self.config.path_case {
            PathCase::Snake => identifier.to_snake_case(),
            PathCase::Kebab => identifier.to_kebab_case(),
        };
        Some((RoutePath::Literal(derived), identifier.to_string()))
    }

    fn sub_builder(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            config: self.config,
            routes: Vec::new(),
        }
    }

    fn push_group(&mut self, prefix: RoutePath, children: Vec<RouteEntry>) -> &mut PathGroup {
        let group = PathGroup::new(prefix, children, self.namespace.clone());
        self.routes.push(RouteEntry::Group(group));
        match self.routes.last_mut() {
            Some(RouteEntry::Group(group)) => group,
            _ => unreachable!("a group was just pushed"),
        }
    }

    /// Declare a group. The callback registers the group's children on a
    /// sub-builder sharing this builder's config and namespace.
    pub fn path<F>(&mut self, prefix: impl Into<RoutePath>, build: F) -> &mut PathGroup
    where
        F: FnOnce(&mut Router),
    {
        let mut scoped = self.sub_builder();
        build(&mut scoped);
        self.push_group(prefix.into(), scoped.routes)
    }

    /// Like [`Router::path`], for callbacks that register fallibly. Nothing is
    /// added when the callback fails.
    pub fn try_path<F>(&mut self, prefix: impl Into<RoutePath>, build: F) -> Result<&mut PathGroup, RouteError>
    where
        F: FnOnce(&mut Router) -> Result<(), RouteError>,
    {
        let mut scoped = self.sub_builder();
        build(&mut scoped)?;
        Ok(self.push_group(prefix.into(), scoped.routes))
    }

    /// A prefix-less group bound to `controller`.
    pub fn use_controller<F>(&mut self, controller: &str, build: F) -> &mut PathGroup
    where
        F: FnOnce(&mut Router),
    {
        self.path("", build).controller(controller)
    }

    verbs! {
        get => "GET",
        post => "POST",
        put => "PUT",
        patch => "PATCH",
        delete => "DELETE",
        head => "HEAD",
        options => "OPTIONS",
        /// Matches every request method.
        all => "ALL",
        /// Alias of [`Router::all`].
        any => "ALL",
        checkout => "CHECKOUT",
        copy => "COPY",
        lock => "LOCK",
        merge => "MERGE",
        mkactivity => "MKACTIVITY",
        mkcol => "MKCOL",
        r#move => "MOVE",
        m_search => "M-SEARCH",
        notify => "NOTIFY",
        purge => "PURGE",
        report => "REPORT",
        search => "SEARCH",
        subscribe => "SUBSCRIBE",
        trace => "TRACE",
        unlock => "UNLOCK",
        unsubscribe => "UNSUBSCRIBE",
    }

    /// Register several routes sharing one method.
    pub fn add_many_routes<I>(&mut self, method: &str, entries: I) -> Result<(), RouteError>
    where
        I: IntoIterator,
        I::Item: Into<ManyRoute>,
    {
        for entry in entries {
            let ManyRoute { path, mut action, mut name } = entry.into();

            // `("@show", true)` means "name it", not "handler `true`".
            let shorthand = path.starts_with('@') || path.starts_with('=');
            if shorthand && action.is_some() && name.is_none() {
                name = action.take();
            }

            let handler = match action {
                Some(Slot::Text(identifier)) if !identifier.is_empty() => Some(Handler::Named(identifier)),
                _ => None,
            };

            let route = self.add_route(method, path, handler);
            match name {
                Some(Slot::Text(name)) if !name.is_empty() => {
                    route.named(name);
                }
                Some(Slot::Flag(true)) => {
                    route.action_as_name()?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    many_verbs! {
        get_many => "GET",
        post_many => "POST",
        put_many => "PUT",
        patch_many => "PATCH",
        delete_many => "DELETE",
    }

    /// Flatten the declared tree into the dispatch-ready route list.
    pub fn compile(&self) -> Result<CompiledRoutes, RouteError> {
        compiler::compile(&self.routes)
    }
}

/// The handler or name position of a bulk entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Text(String),
    /// `true` in the name position derives the name from the handler.
    Flag(bool),
}

impl From<&str> for Slot {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Slot {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for Slot {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

/// One entry for [`Router::add_many_routes`]: a path, or a
/// `(path, handler)` / `(path, handler, name)` tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManyRoute {
    pub path: String,
    pub action: Option<Slot>,
    pub name: Option<Slot>,
}

impl From<&str> for ManyRoute {
    fn from(path: &str) -> Self {
        Self {
            path: path.to_string(),
            action: None,
            name: None,
        }
    }
}

impl<A: Into<Slot>> From<(&str, A)> for ManyRoute {
    fn from((path, action): (&str, A)) -> Self {
        Self {
            path: path.to_string(),
            action: Some(action.into()),
            name: None,
        }
    }
}

impl<A: Into<Slot>, N: Into<Slot>> From<(&str, A, N)> for ManyRoute {
    fn from((path, action, name): (&str, A, N)) -> Self {
        Self {
            path: path.to_string(),
            action: Some(action.into()),
            name: Some(name.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_route(router: &Router) -> &Route {
        match router.routes() {
            [RouteEntry::Route(route)] => route,
            other => panic!("expected one route, got {other:?}"),
        }
    }

    fn identifier(route: &Route) -> Option<&str> {
        route.handler().and_then(Handler::identifier)
    }

    #[test]
    fn test_at_shorthand() {
        let mut router = Router::new();
        router.add_route("get", "@show_profile", None);

        let route = only_route(&router);
        assert_eq!(route.method(), "GET");
        assert_eq!(route.path().source(), "show_profile");
        assert_eq!(identifier(route), Some("show_profile"));
    }

    #[test]
    fn test_at_shorthand_case_conversion() {
        let mut router = Router::new();
        router.get("@showProfile", None);
        assert_eq!(only_route(&router).path().source(), "show_profile");

        let mut router = Router::with_config(RouterConfig {
            path_case: PathCase::Kebab,
        });
        router.get("@showProfile", None);
        let route = only_route(&router);
        assert_eq!(route.path().source(), "show-profile");
        assert_eq!(identifier(route), Some("showProfile"));
    }

    #[test]
    fn test_equals_shorthand() {
        let mut router = Router::new();
        router.get("=Home@index", None);

        let route = only_route(&router);
        assert_eq!(route.path().source(), "");
        assert_eq!(identifier(route), Some("Home@index"));
    }

    #[test]
    fn test_explicit_handler_disables_shorthand() {
        let mut router = Router::new();
        router.get("@literal", Handler::named("Other@run"));

        let route = only_route(&router);
        assert_eq!(route.path().source(), "@literal");
        assert_eq!(identifier(route), Some("Other@run"));
    }

    #[test]
    fn test_namespace_prefix() {
        let mut router = Router::new().with_namespace("Admin");
        router.get("/a", Handler::named("Users@index"));
        router.get("/b", Handler::named("Api::Users@index"));
        router.get("/c", Handler::named("plain"));

        let ids: Vec<_> = router
            .routes()
            .iter()
            .filter_map(|entry| match entry {
                RouteEntry::Route(route) => identifier(route),
                RouteEntry::Group(_) => None,
            })
            .collect();
        assert_eq!(ids, ["Admin::Users@index", "Api::Users@index", "plain"]);
    }

    #[test]
    fn test_verb_methods() {
        let mut router = Router::new();
        router.any("/a", None);
        router.m_search("/b", None);
        router.r#move("/c", None);
        router.unsubscribe("/d", None);

        let methods: Vec<_> = router
            .routes()
            .iter()
            .filter_map(|entry| match entry {
                RouteEntry::Route(route) => Some(route.method().to_string()),
                RouteEntry::Group(_) => None,
            })
            .collect();
        assert_eq!(methods, ["ALL", "M-SEARCH", "MOVE", "UNSUBSCRIBE"]);
    }

    #[test]
    fn test_scoped_sub_builder() {
        let mut router = Router::new().with_namespace("Web");
        router.get("/", None);
        router.path("/api", |api| {
            assert_eq!(api.namespace(), Some("Web"));
            assert!(api.routes().is_empty());
            api.get("/users", None);
            api.path("/user/:user", |user| {
                user.get("", None);
            });
        });
        router.get("/about", None);

        assert_eq!(router.routes().len(), 3);
        assert_eq!(router.route_count(), 4);
        match &router.routes()[1] {
            RouteEntry::Group(group) => {
                assert_eq!(group.prefix().source(), "/api");
                assert_eq!(group.children().len(), 2);
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn test_try_path_failure_adds_nothing() {
        let mut router = Router::new();
        let result = router.try_path("/x", |x| {
            x.get("/y", None).action_as_name()?;
            Ok(())
        });
        assert!(result.is_err());
        assert!(router.routes().is_empty());
    }

    #[test]
    fn test_use_controller() {
        let mut router = Router::new().with_namespace("Admin");
        router.use_controller("Users", |users| {
            users.get("/", Handler::named("index"));
        });

        match router.routes() {
            [RouteEntry::Group(group)] => {
                assert_eq!(group.prefix().source(), "");
                assert_eq!(group.controller_binding(), Some("Admin::Users"));
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn test_add_many_routes() {
        let mut router = Router::new();
        router
            .get_many([
                ManyRoute::from("@index"),
                ("/about", "Pages@about").into(),
                ("/contact", "Pages@contact", "contact_page").into(),
                ("/team", "Pages@team", true).into(),
            ])
            .unwrap();

        let summary: Vec<_> = router
            .routes()
            .iter()
            .filter_map(|entry| match entry {
                RouteEntry::Route(route) => Some((
                    route.path().source().to_string(),
                    identifier(route).map(str::to_string),
                    route.name().map(str::to_string),
                )),
                RouteEntry::Group(_) => None,
            })
            .collect();

        assert_eq!(
            summary,
            vec![
                ("index".into(), Some("index".into()), None),
                ("/about".into(), Some("Pages@about".into()), None),
                ("/contact".into(), Some("Pages@contact".into()), Some("contact_page".into())),
                ("/team".into(), Some("Pages@team".into()), Some("team".into())),
            ]
        );
    }

    #[test]
    fn test_many_shorthand_slot_shift() {
        let mut router = Router::new();
        router
            .post_many([
                ManyRoute::from(("@save", true)),
                ("=Forms@submit", "submit_form").into(),
            ])
            .unwrap();

        let named: Vec<_> = router
            .routes()
            .iter()
            .filter_map(|entry| match entry {
                RouteEntry::Route(route) => route.name().map(str::to_string),
                RouteEntry::Group(_) => None,
            })
            .collect();
        assert_eq!(named, ["save", "submit_form"]);
    }

    #[test]
    fn test_many_name_flag_without_handler_fails() {
        let mut router = Router::new();
        let err = router.delete_many([("/x", "", true)]).unwrap_err();
        assert!(matches!(err, RouteError::MissingAction { .. }));
    }
}
