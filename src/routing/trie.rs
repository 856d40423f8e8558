//! Prefix tree over path segments.
//!
//! # Design Decisions
//! - Children kept in insertion order (no sorting, no priority field)
//! - Named segments at one depth share a node, as do wildcards; the
//!   parameter name comes from the terminal pattern, not the node
//! - Only a node carrying a pattern is a match

use axum::http::Method;

use crate::routing::error::RouteError;
use crate::routing::pattern::Segment;

/// A node in the per-method routing trie.
#[derive(Debug, Default)]
pub struct Node {
    /// Segment text as first registered (`user`, `:id`, `*filepath`).
    part: String,
    /// True for named and wildcard segments.
    is_param: bool,
    /// Full pattern of the route ending here, if any.
    pattern: Option<String>,
    children: Vec<Node>,
}

impl Node {
    fn child(segment: &Segment<'_>) -> Self {
        let part = match segment {
            Segment::Static(text) => (*text).to_string(),
            Segment::Named(name) => format!(":{}", name),
            Segment::Wildcard(name) => format!("*{}", name),
        };
        Self {
            part,
            is_param: segment.is_parameterized(),
            pattern: None,
            children: Vec::new(),
        }
    }

    fn is_wildcard(&self) -> bool {
        self.is_param && self.part.starts_with('*')
    }

    /// Whether this node stands for `segment` at its depth.
    fn same_identity(&self, segment: &Segment<'_>) -> bool {
        match segment {
            Segment::Static(text) => !self.is_param && self.part == *text,
            Segment::Named(_) => self.is_param && !self.is_wildcard(),
            Segment::Wildcard(_) => self.is_wildcard(),
        }
    }

    /// Terminal pattern of this node.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Insert `pattern`, reusing existing nodes for shared prefixes.
    ///
    /// Fails if another registration already ends on the same node.
    pub fn insert(
        &mut self,
        method: &Method,
        pattern: &str,
        segments: &[Segment<'_>],
    ) -> Result<(), RouteError> {
        let mut node = self;
        for segment in segments {
            let index = match node.children.iter().position(|c| c.same_identity(segment)) {
                Some(index) => index,
                None => {
                    node.children.push(Node::child(segment));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }

        if let Some(existing) = &node.pattern {
            return Err(if existing == pattern {
                RouteError::Duplicate {
                    method: method.clone(),
                    pattern: pattern.to_string(),
                }
            } else {
                RouteError::Conflict {
                    method: method.clone(),
                    pattern: pattern.to_string(),
                    existing: existing.clone(),
                }
            });
        }

        node.pattern = Some(pattern.to_string());
        Ok(())
    }

    /// Depth-first search for the terminal node matching `parts`.
    pub fn search(&self, parts: &[&str]) -> Option<&Node> {
        self.search_from(parts, 0)
    }

    fn search_from(&self, parts: &[&str], height: usize) -> Option<&Node> {
        if height == parts.len() || self.is_wildcard() {
            return self.pattern.as_ref().map(|_| self);
        }

        let part = parts[height];
        let literal = self
            .children
            .iter()
            .filter(|c| !c.is_param && c.part == part);
        let params = self.children.iter().filter(|c| c.is_param);

        literal
            .chain(params)
            .find_map(|child| child.search_from(parts, height + 1))
    }

    /// Collect every pattern registered under this node.
    pub fn patterns<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(pattern) = &self.pattern {
            out.push(pattern);
        }
        for child in &self.children {
            child.patterns(out);
        }
    }
}
