//! Route lookup table.
//!
//! # Responsibilities
//! - Index compiled routes for O(1) exact lookups
//! - Scan parameterized routes in declaration order
//! - Remember pattern hits and misses in bounded caches
//!
//! # Design Decisions
//! - Built once from a frozen route list; only the caches mutate
//! - Exact lookup tries `"<METHOD> path"`, then `"ALL path"`
//! - A repeated route key replaces the earlier route in place: the scan
//!   keeps the first declaration's position and serves the last handler
//! - The hit cache is keyed by path and holds one match per method, so a
//!   cached answer is always the answer a fresh scan would give
//! - Explicit `NotFound` rather than a silent default

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::dispatch::cache::BoundedCache;
use crate::observability::metrics;
use crate::routing::compiler::{route_key, CompiledRoute, CompiledRoutes};
use crate::routing::matcher::Params;
use crate::routing::route::ALL_METHODS;

/// A remembered pattern match: which route, and the params it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMatch {
    pub route_key: String,
    pub params: Params,
}

/// Cached matches for one path, by uppercased request method.
pub type PathHits = HashMap<String, CachedMatch>;

/// Where a match came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Exact,
    Cached,
    Scanned,
}

/// Result of a lookup.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found {
        route: Arc<CompiledRoute>,
        params: Params,
        source: MatchSource,
    },
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn route(&self) -> Option<&CompiledRoute> {
        match self {
            Self::Found { route, .. } => Some(route.as_ref()),
            Self::NotFound => None,
        }
    }

    pub fn params(&self) -> Option<&Params> {
        match self {
            Self::Found { params, .. } => Some(params),
            Self::NotFound => None,
        }
    }
}

/// Immutable route index plus the hit and miss caches.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Arc<CompiledRoute>>,
    exact: HashMap<String, Arc<CompiledRoute>>,
    by_key: HashMap<String, Arc<CompiledRoute>>,
    patterns: Vec<Arc<CompiledRoute>>,
    hits: BoundedCache<String, PathHits>,
    misses: BoundedCache<String, ()>,
    scans: AtomicU64,
}

impl RouteTable {
    pub fn new(routes: CompiledRoutes, config: &DispatchConfig) -> Self {
        let routes: Vec<_> = routes.into_vec().into_iter().map(Arc::new).collect();

        let mut exact = HashMap::new();
        let mut by_key = HashMap::new();
        let mut patterns: Vec<Arc<CompiledRoute>> = Vec::new();
        let mut pattern_slots: HashMap<String, usize> = HashMap::new();

        for route in &routes {
            let key = route.key();
            if route.matcher().is_some() {
                match pattern_slots.get(&key) {
                    Some(&slot) => patterns[slot] = route.clone(),
                    None => {
                        pattern_slots.insert(key.clone(), patterns.len());
                        patterns.push(route.clone());
                    }
                }
            } else {
                exact.insert(key.clone(), route.clone());
            }
            by_key.insert(key, route.clone());
        }

        metrics::record_route_count(routes.len());
        tracing::debug!(
            routes = routes.len(),
            exact = exact.len(),
            patterns = patterns.len(),
            "Route table built"
        );

        Self {
            routes,
            exact,
            by_key,
            patterns,
            hits: BoundedCache::new(config.routes_cache_size, config.routes_cache_ttl()),
            misses: BoundedCache::new(config.not_found_cache_size, config.not_found_cache_ttl()),
            scans: AtomicU64::new(0),
        }
    }

    /// Match a request. `method` is compared case-insensitively.
    pub fn resolve(&self, method: &str, path: &str) -> Resolution {
        let method = method.to_ascii_uppercase();

        if let Some(route) = self
            .exact
            .get(&route_key(&method, path))
            .or_else(|| self.exact.get(&route_key(ALL_METHODS, path)))
        {
            return Resolution::Found {
                route: route.clone(),
                params: Params::new(),
                source: MatchSource::Exact,
            };
        }

        if let Some(found) = self.cached(&method, path) {
            return found;
        }

        let miss_key = route_key(&method, path);
        if self.misses.is_enabled() {
            let known_miss = self.misses.contains(&miss_key);
            metrics::record_cache_lookup("not_found", known_miss);
            if known_miss {
                return Resolution::NotFound;
            }
        }

        self.scan(&method, path, miss_key)
    }

    fn cached(&self, method: &str, path: &str) -> Option<Resolution> {
        if !self.hits.is_enabled() {
            return None;
        }

        let found = self.lookup_hit(method, path).and_then(|cached| {
            let route = self.by_key.get(&cached.route_key)?;
            Some(Resolution::Found {
                route: route.clone(),
                params: cached.params,
                source: MatchSource::Cached,
            })
        });

        metrics::record_cache_lookup("routes", found.is_some());
        found
    }

    fn lookup_hit(&self, method: &str, path: &str) -> Option<CachedMatch> {
        self.hits.get(&path.to_string())?.remove(method)
    }

    fn scan(&self, method: &str, path: &str, miss_key: String) -> Resolution {
        self.scans.fetch_add(1, Ordering::Relaxed);

        for route in self.patterns.iter().filter(|r| r.matches_method(method)) {
            let Some(params) = route.matcher().and_then(|m| m.extract(path)) else {
                continue;
            };

            metrics::record_pattern_scan(true);
            let hit = CachedMatch {
                route_key: route.key(),
                params: params.clone(),
            };
            self.hits.update(path.to_string(), |current| {
                let mut hits = current.unwrap_or_default();
                hits.insert(method.to_string(), hit);
                hits
            });
            return Resolution::Found {
                route: route.clone(),
                params,
                source: MatchSource::Scanned,
            };
        }

        metrics::record_pattern_scan(false);
        self.misses.insert(miss_key, ());
        Resolution::NotFound
    }

    /// Routes in declaration order, duplicates included.
    pub fn routes(&self) -> &[Arc<CompiledRoute>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route for `"<METHOD> path"`, last declaration winning.
    pub fn get(&self, key: &str) -> Option<&Arc<CompiledRoute>> {
        self.by_key.get(key)
    }

    /// Number of fallback scans performed so far.
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// The cached pattern match for `method` on `path`, if any.
    pub fn cached_match(&self, method: &str, path: &str) -> Option<CachedMatch> {
        self.lookup_hit(&method.to_ascii_uppercase(), path)
    }

    pub fn is_known_miss(&self, method: &str, path: &str) -> bool {
        self.misses.contains(&route_key(&method.to_ascii_uppercase(), path))
    }

    pub fn clear_caches(&self) {
        self.hits.clear();
        self.misses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::Handler;
    use crate::routing::Router;

    fn table_with(config: DispatchConfig) -> RouteTable {
        let mut router = Router::new();
        router.get("/", Handler::named("Home@index"));
        router.get("/users/:id", Handler::named("Users@show"));
        router.post("/users/:id", Handler::named("Users@update"));
        router.all("/hooks/:name", Handler::named("Hooks@run"));
        router.any("/ping", Handler::named("Ping@pong"));
        RouteTable::new(router.compile().unwrap(), &config)
    }

    fn table() -> RouteTable {
        table_with(DispatchConfig::default())
    }

    fn found_key(resolution: &Resolution) -> Option<String> {
        resolution.route().map(CompiledRoute::key)
    }

    #[test]
    fn test_exact_match_skips_scan() {
        let table = table();
        let found = table.resolve("get", "/");
        assert_eq!(found_key(&found), Some("GET /".into()));
        assert!(matches!(found, Resolution::Found { source: MatchSource::Exact, .. }));
        assert_eq!(table.scan_count(), 0);
    }

    #[test]
    fn test_exact_all_route_matches_any_method() {
        let table = table();
        assert_eq!(found_key(&table.resolve("DELETE", "/ping")), Some("ALL /ping".into()));
    }

    #[test]
    fn test_pattern_hit_is_cached() {
        let table = table();

        let first = table.resolve("GET", "/users/42");
        assert!(matches!(first, Resolution::Found { source: MatchSource::Scanned, .. }));
        assert_eq!(table.scan_count(), 1);

        let cached = table.cached_match("get", "/users/42").unwrap();
        assert_eq!(cached.route_key, "GET /users/:id");
        assert_eq!(cached.params.get("id").map(String::as_str), Some("42"));

        let second = table.resolve("GET", "/users/42");
        match second {
            Resolution::Found { params, source, .. } => {
                assert_eq!(source, MatchSource::Cached);
                assert_eq!(params.get("id").map(String::as_str), Some("42"));
            }
            Resolution::NotFound => panic!("expected a match"),
        }
        assert_eq!(table.scan_count(), 1);
    }

    #[test]
    fn test_cached_hit_for_other_method_rescans() {
        let table = table();
        table.resolve("GET", "/users/42");

        let post = table.resolve("POST", "/users/42");
        assert_eq!(found_key(&post), Some("POST /users/:id".into()));
        assert_eq!(table.scan_count(), 2);
    }

    #[test]
    fn test_miss_is_cached() {
        let table = table();
        assert!(!table.resolve("GET", "/nope").is_found());
        assert!(!table.resolve("GET", "/nope").is_found());
        assert_eq!(table.scan_count(), 1);
        assert!(table.is_known_miss("get", "/nope"));
    }

    #[test]
    fn test_trailing_slash_on_parameterized_path() {
        let table = table();
        assert_eq!(found_key(&table.resolve("GET", "/users/7/")), Some("GET /users/:id".into()));
    }

    #[test]
    fn test_all_pattern_route() {
        let table = table();
        let found = table.resolve("PATCH", "/hooks/deploy");
        assert_eq!(found_key(&found), Some("ALL /hooks/:name".into()));
    }

    #[test]
    fn test_disabled_caches_always_scan() {
        let table = table_with(DispatchConfig {
            routes_cache_size: 0,
            not_found_cache_size: 0,
            ..DispatchConfig::default()
        });

        table.resolve("GET", "/users/1");
        table.resolve("GET", "/users/1");
        table.resolve("GET", "/missing");
        table.resolve("GET", "/missing");
        assert_eq!(table.scan_count(), 4);
        assert!(table.cached_match("GET", "/users/1").is_none());
    }

    fn identifier(resolution: &Resolution) -> Option<&str> {
        resolution.route().and_then(CompiledRoute::handler).and_then(Handler::identifier)
    }

    #[test]
    fn test_cached_answer_is_per_method() {
        let mut router = Router::new();
        router.post("/x/:a", Handler::named("Specific@post"));
        router.all("/x/:a", Handler::named("Catch@all"));
        let table = RouteTable::new(router.compile().unwrap(), &DispatchConfig::default());

        assert_eq!(identifier(&table.resolve("POST", "/x/1")), Some("Specific@post"));
        assert_eq!(identifier(&table.resolve("GET", "/x/1")), Some("Catch@all"));

        let again = table.resolve("POST", "/x/1");
        assert_eq!(identifier(&again), Some("Specific@post"));
        assert!(matches!(again, Resolution::Found { source: MatchSource::Cached, .. }));
        assert_eq!(table.cached_match("GET", "/x/1").unwrap().route_key, "ALL /x/:a");
        assert_eq!(table.cached_match("POST", "/x/1").unwrap().route_key, "POST /x/:a");
    }

    #[test]
    fn test_duplicate_pattern_route_serves_last() {
        let mut router = Router::new();
        router.get("/u/:id", Handler::named("First@run"));
        router.get("/u/:rest", Handler::named("Other@run"));
        router.get("/u/:id", Handler::named("Second@run"));
        let table = RouteTable::new(router.compile().unwrap(), &DispatchConfig::default());

        let scanned = table.resolve("GET", "/u/1");
        assert!(matches!(scanned, Resolution::Found { source: MatchSource::Scanned, .. }));
        assert_eq!(identifier(&scanned), Some("Second@run"));

        let cached = table.resolve("GET", "/u/1");
        assert!(matches!(cached, Resolution::Found { source: MatchSource::Cached, .. }));
        assert_eq!(identifier(&cached), Some("Second@run"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_unrepresentable_ttl_does_not_panic() {
        let mut config = crate::config::AppConfig::default();
        config.dispatch.routes_cache_ttl_secs = u64::MAX;
        config.dispatch.not_found_cache_ttl_secs = u64::MAX;
        assert!(crate::config::validate_config(&config).is_ok());

        let table = table_with(config.dispatch);
        assert!(!table.resolve("GET", "/nope").is_found());
        assert!(!table.resolve("GET", "/nope").is_found());
        assert!(table.is_known_miss("GET", "/nope"));

        table.resolve("GET", "/users/5");
        let cached = table.resolve("GET", "/users/5");
        assert!(matches!(cached, Resolution::Found { source: MatchSource::Cached, .. }));
        assert_eq!(table.scan_count(), 2);
    }

    #[test]
    fn test_caches_agree_with_fresh_scans() {
        fn mixed_routes() -> Router {
            let mut router = Router::new();
            router.get("/", Handler::named("Home@index"));
            router.post("/x/:a", Handler::named("X@post"));
            router.all("/x/:a", Handler::named("X@all"));
            router.get("/users/:id", Handler::named("Users@show"));
            router.any("/users/:id", Handler::named("Users@any"));
            router.put("/users/:id", Handler::named("Users@update"));
            router.get("/u/:id", Handler::named("U@first"));
            router.get("/u/:id", Handler::named("U@second"));
            router.delete("/files/:dir/:name", Handler::named("Files@delete"));
            router.path("/api", |api| {
                api.get(regex::Regex::new(r"^/v(?P<version>\d+)$").unwrap(), Handler::named("Api@version"));
            });
            router
        }

        let cached = RouteTable::new(mixed_routes().compile().unwrap(), &DispatchConfig::default());
        let uncached = RouteTable::new(
            mixed_routes().compile().unwrap(),
            &DispatchConfig {
                routes_cache_size: 0,
                not_found_cache_size: 0,
                ..DispatchConfig::default()
            },
        );

        let methods = ["GET", "POST", "PUT", "DELETE", "PATCH"];
        let paths = ["/", "/x/1", "/users/7", "/users/7/", "/u/3", "/files/a/b", "/api/v2", "/api/vx", "/nope"];

        // Interleave methods and paths in several orders so every cache entry
        // is read back under a different request history.
        for round in 0..3 {
            for (i, path) in paths.iter().enumerate() {
                for j in 0..methods.len() {
                    let method = methods[(i + j + round) % methods.len()];
                    let expected = uncached.resolve(method, path);
                    let actual = cached.resolve(method, path);
                    assert_eq!(
                        (identifier(&actual), actual.params()),
                        (identifier(&expected), expected.params()),
                        "{method} {path} in round {round}"
                    );
                }
            }
        }

        assert!(cached.scan_count() < uncached.scan_count());
    }

    #[test]
    fn test_duplicate_key_serves_last() {
        let mut router = Router::new();
        router.get("/x", Handler::named("First@run"));
        router.get("/x", Handler::named("Second@run"));
        let table = RouteTable::new(router.compile().unwrap(), &DispatchConfig::default());

        let found = table.resolve("GET", "/x");
        let handler = found.route().and_then(CompiledRoute::handler).and_then(Handler::identifier);
        assert_eq!(handler, Some("Second@run"));
        assert_eq!(table.len(), 2);
    }
}
