//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Own one trie root per HTTP method
//! - Map (method, pattern) to the registered handler
//! - Resolve a request path to a handler plus extracted parameters
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Generic over the handler type so matching can be tested in isolation
//! - Explicit `None` on a miss rather than a silent default

use std::collections::HashMap;

use axum::http::Method;
use percent_encoding::percent_decode_str;

use crate::routing::error::RouteError;
use crate::routing::pattern::{parse_pattern, split_path, Segment};
use crate::routing::trie::Node;

/// Parameters bound while matching, keyed by name.
pub type Params = HashMap<String, String>;

/// A successful route resolution.
#[derive(Debug)]
pub struct RouteMatch<'r, H> {
    /// Pattern the route was registered with.
    pub pattern: &'r str,
    pub handler: &'r H,
    pub params: Params,
}

/// Method-aware route table backed by prefix trees.
#[derive(Debug)]
pub struct Router<H> {
    roots: HashMap<Method, Node>,
    handlers: HashMap<Method, HashMap<String, H>>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self {
            roots: HashMap::new(),
            handlers: HashMap::new(),
        }
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and `pattern`.
    pub fn add_route(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError> {
        let segments = parse_pattern(pattern)?;
        self.roots
            .entry(method.clone())
            .or_default()
            .insert(&method, pattern, &segments)?;
        self.handlers
            .entry(method)
            .or_default()
            .insert(pattern.to_string(), handler);
        Ok(())
    }

    /// Find the route for `method` and `path`.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, H>> {
        let parts = split_path(path);
        let node = self.roots.get(method)?.search(&parts)?;
        let pattern = node.pattern()?;
        let handler = self.handlers.get(method)?.get(pattern)?;

        Some(RouteMatch {
            pattern,
            handler,
            params: extract_params(pattern, &parts),
        })
    }

    /// Registered routes as (method, pattern) pairs.
    pub fn routes(&self) -> Vec<(&Method, &str)> {
        let mut routes = Vec::new();
        for (method, root) in &self.roots {
            let mut patterns = Vec::new();
            root.patterns(&mut patterns);
            routes.extend(patterns.into_iter().map(|p| (method, p)));
        }
        routes
    }

    pub fn len(&self) -> usize {
        self.handlers.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Walk the matched pattern alongside the request segments.
///
/// Bound values are percent-decoded; wildcard remainders are decoded per
/// segment before joining.
fn extract_params(pattern: &str, parts: &[&str]) -> Params {
    let mut params = Params::new();
    for (index, raw) in pattern.split('/').filter(|s| !s.is_empty()).enumerate() {
        match Segment::parse(raw) {
            Segment::Named(name) => {
                if let Some(value) = parts.get(index) {
                    params.insert(name.to_string(), decode(value));
                }
            }
            Segment::Wildcard(name) => {
                if !name.is_empty() {
                    let rest = parts
                        .get(index..)
                        .map(|rest| rest.iter().map(|part| decode(part)).collect::<Vec<_>>().join("/"))
                        .unwrap_or_default();
                    params.insert(name.to_string(), rest);
                }
                break;
            }
            Segment::Static(_) => {}
        }
    }
    params
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
