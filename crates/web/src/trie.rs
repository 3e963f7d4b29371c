//! Segment trie used to match request paths against registered patterns.
//!
//! One trie is kept per HTTP method. Every edge is one path segment; a node
//! reached by the last segment of a registered pattern remembers the full
//! pattern text, which is later used to look up the handler and bind path
//! parameters.
//!
//! Insertion reuses the first existing child that is compatible with the new
//! segment, where a dynamic child (`:name` or `*name`) is compatible with any
//! segment. Registering `/user/:id` and then `/user/all` therefore stores both
//! under the `:id` node. Lookup walks the trie depth first and backtracks when
//! a branch dead-ends, so a static child that fails to complete a match still
//! lets a later dynamic sibling try.

use tracing::warn;

use crate::pattern::{is_dynamic, is_wildcard};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Full pattern of the route ending here, `None` for intermediate nodes
    pattern: Option<String>,
    segment: String,
    children: Vec<Node>,
    is_dynamic: bool,
}

impl Node {
    fn new(segment: &str) -> Self {
        Self { pattern: None, segment: segment.to_owned(), children: Vec::new(), is_dynamic: is_dynamic(segment) }
    }

    /// Records `pattern` under the path spelled by `tokens[depth..]`.
    ///
    /// Inserting the same pattern again leaves the shape of the trie untouched.
    pub fn insert(&mut self, pattern: &str, tokens: &[&str], depth: usize) {
        let Some(&token) = tokens.get(depth) else {
            self.pattern = Some(pattern.to_owned());
            return;
        };

        let child = self.compatible_child(pattern, token);
        child.insert(pattern, tokens, depth + 1);
    }

    fn compatible_child(&mut self, pattern: &str, token: &str) -> &mut Node {
        let position = match self.children.iter().position(|child| child.segment == token || child.is_dynamic) {
            Some(position) => {
                let existing = &self.children[position].segment;
                if existing != token {
                    warn!(pattern, segment = token, shared_with = %existing, "route segment shares an existing dynamic node");
                }
                position
            }
            None => {
                self.children.push(Node::new(token));
                self.children.len() - 1
            }
        };

        &mut self.children[position]
    }

    /// Finds the node terminating a route that matches `tokens[depth..]`.
    ///
    /// Children are tried in insertion order; a child that fails to produce a
    /// match gives way to the next compatible one.
    pub fn search(&self, tokens: &[&str], depth: usize) -> Option<&Node> {
        let Some(&token) = tokens.get(depth).filter(|_| !is_wildcard(&self.segment)) else {
            return self.pattern.as_ref().map(|_| self);
        };

        self.children
            .iter()
            .filter(|child| child.segment == token || child.is_dynamic)
            .find_map(|child| child.search(tokens, depth + 1))
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Collects the patterns of every route terminating at or below this node.
    pub fn patterns(&self) -> Vec<&str> {
        let mut patterns = Vec::new();
        self.collect_patterns(&mut patterns);
        patterns
    }

    fn collect_patterns<'a>(&'a self, patterns: &mut Vec<&'a str>) {
        if let Some(pattern) = self.pattern() {
            patterns.push(pattern);
        }
        for child in &self.children {
            child.collect_patterns(patterns);
        }
    }
}
