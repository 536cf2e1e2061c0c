//! Path groups: a prefix shared by a fixed list of child nodes.

use crate::routing::path::RoutePath;
use crate::routing::route::Route;

/// A node in the declared route tree.
#[derive(Debug, Clone)]
pub enum RouteEntry {
    Route(Route),
    Group(PathGroup),
}

impl RouteEntry {
    pub fn path(&self) -> &RoutePath {
        match self {
            Self::Route(route) => route.path(),
            Self::Group(group) => group.prefix(),
        }
    }

    /// Number of routes reachable from this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Route(_) => 1,
            Self::Group(group) => group.leaf_count(),
        }
    }
}

/// A path prefix plus the nodes declared inside it.
///
/// Children are fixed once the grouping callback returns; the fluent calls
/// only change what the group contributes to its descendants.
#[derive(Debug, Clone)]
pub struct PathGroup {
    prefix: RoutePath,
    children: Vec<RouteEntry>,
    namespace: Option<String>,
    controller: Option<String>,
    name_prefix: Option<String>,
    actions_as_name: bool,
}

impl PathGroup {
    pub(crate) fn new(prefix: RoutePath, children: Vec<RouteEntry>, namespace: Option<String>) -> Self {
        Self {
            prefix,
            children,
            namespace,
            controller: None,
            name_prefix: None,
            actions_as_name: false,
        }
    }

    /// Prefix the names of every named descendant with `prefix.`.
    pub fn as_name(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Bind descendants to a controller. Handler identifiers without an
    /// `@` become `controller@identifier`.
    pub fn controller(&mut self, controller: &str) -> &mut Self {
        let controller = match &self.namespace {
            Some(ns) => format!("{ns}::{controller}"),
            None => controller.to_string(),
        };
        self.controller = Some(controller);
        self
    }

    /// Name every unnamed descendant after its handler action.
    pub fn actions_as_name(&mut self) -> &mut Self {
        self.actions_as_name = true;
        self
    }

    pub fn prefix(&self) -> &RoutePath {
        &self.prefix
    }

    pub fn children(&self) -> &[RouteEntry] {
        &self.children
    }

    pub fn controller_binding(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    pub fn name_prefix(&self) -> Option<&str> {
        self.name_prefix.as_deref()
    }

    pub fn uses_actions_as_name(&self) -> bool {
        self.actions_as_name
    }

    pub fn leaf_count(&self) -> usize {
        self.children.iter().map(RouteEntry::leaf_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> PathGroup {
        let nested = PathGroup::new(
            "/inner".into(),
            vec![RouteEntry::Route(Route::new("GET", "/a", None))],
            None,
        );
        PathGroup::new(
            "/outer".into(),
            vec![
                RouteEntry::Route(Route::new("GET", "/", None)),
                RouteEntry::Group(nested),
                RouteEntry::Route(Route::new("POST", "/", None)),
            ],
            Some("Admin".into()),
        )
    }

    #[test]
    fn test_leaf_count_includes_nested_groups() {
        assert_eq!(group().leaf_count(), 3);
        assert_eq!(group().children().len(), 3);
    }

    #[test]
    fn test_fluent_settings() {
        let mut group = group();
        group.as_name("admin").controller("Users").actions_as_name();

        assert_eq!(group.name_prefix(), Some("admin"));
        assert_eq!(group.controller_binding(), Some("Admin::Users"));
        assert!(group.uses_actions_as_name());
        assert_eq!(group.prefix().source(), "/outer");
    }
}
