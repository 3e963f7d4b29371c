//! Method and path based dispatch.
//!
//! The [`Router`] keeps one [`Node`] trie per HTTP method and a table of
//! handlers keyed by `METHOD-pattern`. A request path is split into segments,
//! matched against the trie of its method, and the matched pattern is used
//! both to find the handler and to bind path parameters.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::{error, trace};

use crate::handler::handler_fn;
use crate::pattern::{PARAM_PREFIX, WILDCARD_PREFIX, parse_pattern};
use crate::trie::Node;
use crate::{Context, HandlerFunc, PathParams};

/// Result of a successful route lookup.
#[derive(Debug)]
pub struct RouteMatch<'router> {
    node: &'router Node,
    pattern: &'router str,
    params: PathParams,
}

impl<'router> RouteMatch<'router> {
    pub fn node(&self) -> &'router Node {
        self.node
    }

    /// The registered pattern that matched
    pub fn pattern(&self) -> &'router str {
        self.pattern
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn into_params(self) -> PathParams {
        self.params
    }
}

pub struct Router {
    roots: HashMap<Method, Node>,
    handlers: HashMap<String, HandlerFunc>,
    not_found: HandlerFunc,
}

impl Router {
    pub fn new() -> Self {
        Self { roots: HashMap::new(), handlers: HashMap::new(), not_found: handler_fn(not_found) }
    }

    /// Registers `handler` for `method` requests matching `pattern`.
    ///
    /// Registering the same method and pattern again replaces the handler.
    pub fn add_route(&mut self, method: Method, pattern: &str, handler: HandlerFunc) {
        let tokens = parse_pattern(pattern);
        let key = handler_key(&method, pattern);

        self.roots.entry(method).or_default().insert(pattern, &tokens, 0);
        self.handlers.insert(key, handler);
    }

    /// Finds the route serving `method` requests to `path`, with the path
    /// parameters it binds.
    pub fn get_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let root = self.roots.get(method)?;
        let tokens = parse_pattern(path);
        let node = root.search(&tokens, 0)?;
        let pattern = node.pattern()?;

        Some(RouteMatch { node, pattern, params: bind_params(pattern, &tokens) })
    }

    /// Builds the tail of the chain for `ctx` and runs the whole chain.
    ///
    /// The matched handler, or the not-found handler, is appended after any
    /// middleware already queued on the context.
    pub fn handle(&self, ctx: &mut Context) {
        let handler = match self.get_route(ctx.method(), ctx.path()) {
            Some(route) => {
                trace!(method = %ctx.method(), path = ctx.path(), pattern = route.pattern(), "route matched");
                match self.handlers.get(&handler_key(ctx.method(), route.pattern())) {
                    Some(handler) => {
                        ctx.set_params(route.into_params());
                        Arc::clone(handler)
                    }
                    None => {
                        error!(method = %ctx.method(), pattern = route.pattern(), "matched route has no handler");
                        Arc::clone(&self.not_found)
                    }
                }
            }
            None => Arc::clone(&self.not_found),
        };

        ctx.push_handler(handler);
        ctx.next();
    }

    /// Registered routes as `(method, pattern)`, sorted.
    pub fn routes(&self) -> Vec<(&Method, &str)> {
        let mut routes: Vec<_> = self
            .roots
            .iter()
            .flat_map(|(method, root)| root.patterns().into_iter().map(move |pattern| (method, pattern)))
            .collect();
        routes.sort_unstable_by(|(m1, p1), (m2, p2)| (m1.as_str(), p1).cmp(&(m2.as_str(), p2)));
        routes
    }

    pub fn root(&self, method: &Method) -> Option<&Node> {
        self.roots.get(method)
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("roots", &self.roots).finish_non_exhaustive()
    }
}

fn handler_key(method: &Method, pattern: &str) -> String {
    format!("{method}-{pattern}")
}

/// Pairs the dynamic segments of `pattern` with the path segments in the same
/// position. A wildcard takes every remaining segment.
fn bind_params(pattern: &str, path_tokens: &[&str]) -> PathParams {
    let mut params = PathParams::empty();
    for (index, segment) in parse_pattern(pattern).into_iter().enumerate() {
        if let Some(name) = segment.strip_prefix(PARAM_PREFIX) {
            params.insert(name, path_tokens.get(index).copied().unwrap_or_default());
        } else if let Some(name) = segment.strip_prefix(WILDCARD_PREFIX) {
            if !name.is_empty() {
                params.insert(name, path_tokens.get(index..).unwrap_or_default().join("/"));
            }
            break;
        }
    }
    params
}

fn not_found(ctx: &mut Context) {
    let body = format!("404 NOT FOUND: {}\n", ctx.path());
    ctx.string(StatusCode::NOT_FOUND, body);
}
