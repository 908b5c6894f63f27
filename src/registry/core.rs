//! Registry core - candidate storage and lookup.
//!
//! The registry is populated during startup composition and read-only afterwards.
//! Lookups borrow route templates as `&str` against `Arc<str>` keys so the resolve
//! hot path never allocates for the lookup itself.

use arc_swap::ArcSwap;
use http::Method;
use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constraint::HeaderMatchConstraint;
use crate::error::ConnegError;

/// Methods a candidate may be registered for.
pub const SUPPORTED_METHODS: [Method; 8] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::HEAD,
    Method::TRACE,
];

/// Registry shared between the dispatcher and the hot reloader.
///
/// Readers `load()` a snapshot; a reload `store()`s a freshly built registry.
pub type SharedRegistry = Arc<ArcSwap<CandidateRegistry>>;

/// Wrap a registry for sharing.
#[must_use]
pub fn shared(registry: CandidateRegistry) -> SharedRegistry {
    Arc::new(ArcSwap::from_pointee(registry))
}

/// Parse a declared method name (case-insensitive) into one of [`SUPPORTED_METHODS`].
///
/// # Errors
///
/// Returns [`ConnegError::InvalidMethod`] for anything else.
pub fn parse_method(raw: &str) -> Result<Method, ConnegError> {
    let upper = raw.trim().to_ascii_uppercase();
    SUPPORTED_METHODS
        .iter()
        .find(|m| m.as_str() == upper)
        .cloned()
        .ok_or_else(|| ConnegError::InvalidMethod(raw.to_string()))
}

/// Opaque handler identifier. `Arc<str>` so selections clone in O(1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(Arc<str>);

impl HandlerId {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for HandlerId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Borrow<str> for HandlerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for HandlerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A handler bound to a route + method, optionally guarded by header constraints.
///
/// A candidate without constraints is the unconditional fallback for its route.
#[derive(Debug, Clone)]
pub struct Candidate {
    handler: HandlerId,
    constraints: Vec<HeaderMatchConstraint>,
}

impl Candidate {
    pub fn new(handler: impl Into<HandlerId>) -> Self {
        Self {
            handler: handler.into(),
            constraints: Vec::new(),
        }
    }

    /// Add a constraint; all constraints of a candidate must hold for it to be eligible.
    #[must_use]
    pub fn with_constraint(mut self, constraint: HeaderMatchConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[inline]
    #[must_use]
    pub fn handler(&self) -> &HandlerId {
        &self.handler
    }

    #[inline]
    #[must_use]
    pub fn constraints(&self) -> &[HeaderMatchConstraint] {
        &self.constraints
    }

    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.constraints.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
struct RouteCandidates {
    /// Few methods per route; linear scan beats hashing here
    methods: Vec<(Method, Vec<Candidate>)>,
}

impl RouteCandidates {
    fn get(&self, method: &Method) -> Option<&Vec<Candidate>> {
        self.methods
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, candidates)| candidates)
    }

    fn get_or_insert(&mut self, method: Method) -> &mut Vec<Candidate> {
        let idx = match self.methods.iter().position(|(m, _)| *m == method) {
            Some(idx) => idx,
            None => {
                self.methods.push((method, Vec::new()));
                self.methods.len() - 1
            }
        };
        &mut self.methods[idx].1
    }
}

/// All handler candidates, keyed by resolved route template and HTTP method.
///
/// Candidates keep registration order within a route + method.
#[derive(Debug, Clone, Default)]
pub struct CandidateRegistry {
    routes: HashMap<Arc<str>, RouteCandidates>,
    /// Route templates in first-registration order, for deterministic listings
    order: Vec<Arc<str>>,
    candidate_count: usize,
}

impl CandidateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `candidate` to the candidates of `route` + `method`.
    ///
    /// Startup-only: the registry is treated as immutable once request serving begins.
    ///
    /// # Errors
    ///
    /// Fails when the route template is not absolute, the handler name is empty, or the
    /// same handler is already registered for this route + method.
    pub fn register(
        &mut self,
        route: &str,
        method: Method,
        candidate: Candidate,
    ) -> Result<(), ConnegError> {
        if !route.starts_with('/') {
            return Err(ConnegError::InvalidRoute(route.to_string()));
        }
        if candidate.handler.as_str().trim().is_empty() {
            return Err(ConnegError::EmptyHandler);
        }

        let key = match self.routes.get_key_value(route) {
            Some((key, _)) => Arc::clone(key),
            None => {
                let key: Arc<str> = Arc::from(route);
                self.order.push(Arc::clone(&key));
                key
            }
        };
        let candidates = self
            .routes
            .entry(key)
            .or_default()
            .get_or_insert(method.clone());

        if candidates.iter().any(|c| c.handler == candidate.handler) {
            return Err(ConnegError::DuplicateCandidate {
                route: route.to_string(),
                method: method.to_string(),
                handler: candidate.handler.to_string(),
            });
        }
        if candidate.is_fallback() && candidates.iter().any(Candidate::is_fallback) {
            warn!(
                route = %route,
                method = %method,
                handler_name = %candidate.handler,
                "Second unconstrained candidate registered; only the first is ever selected"
            );
        }

        debug!(
            route = %route,
            method = %method,
            handler_name = %candidate.handler,
            constraints = candidate.constraints.len(),
            position = candidates.len(),
            "Candidate registered"
        );
        candidates.push(candidate);
        self.candidate_count += 1;
        Ok(())
    }

    /// Candidates for `route` + `method` in registration order; empty if none.
    #[must_use]
    pub fn lookup(&self, route: &str, method: &Method) -> &[Candidate] {
        self.routes
            .get(route)
            .and_then(|entry| entry.get(method))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn contains_route(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    /// Methods with at least one candidate on `route`, in registration order.
    #[must_use]
    pub fn allowed_methods(&self, route: &str) -> Vec<Method> {
        self.routes
            .get(route)
            .map(|entry| entry.methods.iter().map(|(m, _)| m.clone()).collect())
            .unwrap_or_default()
    }

    /// Every `(route, method, candidates)` entry in registration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Method, &[Candidate])> {
        self.order
            .iter()
            .filter_map(|route| self.routes.get(route).map(|entry| (route, entry)))
            .flat_map(|(route, entry)| {
                entry
                    .methods
                    .iter()
                    .map(move |(method, candidates)| (&**route, method, candidates.as_slice()))
            })
    }

    /// All registered handler ids (a handler may appear on several routes).
    pub fn handler_ids(&self) -> impl Iterator<Item = &HandlerId> {
        self.entries()
            .flat_map(|(_, _, candidates)| candidates.iter().map(Candidate::handler))
    }

    /// Number of registered candidates
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidate_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidate_count == 0
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.order.len()
    }

    /// Log a one-line summary of the loaded registry
    pub fn log_summary(&self) {
        let routes_summary: Vec<String> = self
            .entries()
            .take(10)
            .map(|(route, method, candidates)| format!("{method} {route} ({})", candidates.len()))
            .collect();
        info!(
            routes_count = self.route_count(),
            candidates_count = self.len(),
            routes_summary = ?routes_summary,
            "Candidate registry loaded"
        );
    }

    /// Print every route, method and candidate to stdout
    ///
    /// Useful for debugging and verifying that a manifest compiled as expected.
    pub fn dump_routes(&self) {
        println!(
            "[routes] count={} candidates={}",
            self.route_count(),
            self.len()
        );
        for (route, method, candidates) in self.entries() {
            println!("[route] {method} {route}");
            for candidate in candidates {
                if candidate.is_fallback() {
                    println!("  -> {} (fallback)", candidate.handler);
                    continue;
                }
                println!("  -> {}", candidate.handler);
                for constraint in &candidate.constraints {
                    println!("       {constraint}");
                }
            }
        }
    }
}
