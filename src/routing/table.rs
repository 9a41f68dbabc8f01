//! Route storage and lookup.
//!
//! # Responsibilities
//! - Store routes per method in registration order
//! - Replace the handler when a method + pattern pair is registered again
//! - Return the first route whose pattern matches, with its captures
//!
//! # Design Decisions
//! - One ordered `Vec` per method: iteration order is a property of the table,
//!   not of a hash map
//! - Re-registration keeps the route's original position
//! - Lookup is a read-only linear scan (acceptable for typical route counts)
//! - Explicit `None` on no match rather than a silent default

use crate::error::Error;
use crate::routing::method::Method;
use crate::routing::pattern::{Captures, CompiledPattern};

/// A registered (method, pattern, handler) triple.
#[derive(Debug, Clone)]
pub struct Route<H> {
    pub method: Method,
    pub pattern: CompiledPattern,
    pub handler: H,
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub route: &'a Route<H>,
    pub captures: Captures,
}

impl<H> RouteMatch<'_, H> {
    pub fn handler(&self) -> &H {
        &self.route.handler
    }
}

/// Per-method ordered route lists.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    routes: [Vec<Route<H>>; 4],
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self {
            routes: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
        }
    }

    /// Register a handler. Returns `true` when an earlier handler was replaced.
    pub fn register(&mut self, method: Method, pattern: &str, handler: H) -> Result<bool, Error> {
        let routes = &mut self.routes[method.index()];

        if let Some(existing) = routes.iter_mut().find(|r| r.pattern.source() == pattern) {
            existing.handler = handler;
            tracing::debug!(method = %method, pattern = %pattern, "Route handler replaced");
            return Ok(true);
        }

        let compiled = CompiledPattern::compile(pattern)?;
        tracing::debug!(
            method = %method,
            pattern = %pattern,
            params = compiled.param_names().len(),
            "Route registered"
        );
        routes.push(Route {
            method,
            pattern: compiled,
            handler,
        });
        Ok(false)
    }

    /// Find the first route (in registration order) matching `path`.
    pub fn lookup(&self, method: Method, path: &str) -> Option<RouteMatch<'_, H>> {
        self.routes[method.index()].iter().find_map(|route| {
            route
                .pattern
                .matches(path)
                .map(|captures| RouteMatch { route, captures })
        })
    }

    /// Routes registered for `method`, in match order.
    pub fn routes(&self, method: Method) -> &[Route<H>] {
        &self.routes[method.index()]
    }

    pub fn len(&self) -> usize {
        self.routes.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}
