//! Route pattern and request path decomposition.
//!
//! A pattern is a `/`-separated list of segments:
//! - `user`      static, matched literally
//! - `:id`       named, matches exactly one path segment
//! - `*filepath` wildcard, last segment only, matches the rest of the path

use crate::routing::error::RouteError;

/// One component of a route pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Static(&'a str),
    Named(&'a str),
    Wildcard(&'a str),
}

impl<'a> Segment<'a> {
    /// Classify a raw pattern segment by its first character.
    pub fn parse(raw: &'a str) -> Self {
        if let Some(name) = raw.strip_prefix(':') {
            Segment::Named(name)
        } else if let Some(name) = raw.strip_prefix('*') {
            Segment::Wildcard(name)
        } else {
            Segment::Static(raw)
        }
    }

    pub fn is_parameterized(&self) -> bool {
        !matches!(self, Segment::Static(_))
    }
}

/// Split and validate a route pattern.
pub fn parse_pattern(pattern: &str) -> Result<Vec<Segment<'_>>, RouteError> {
    if !pattern.starts_with('/') {
        return Err(RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern must start with '/'",
        });
    }

    let mut segments = Vec::new();
    for raw in pattern.split('/').filter(|s| !s.is_empty()) {
        if let Some(Segment::Wildcard(_)) = segments.last() {
            return Err(RouteError::WildcardNotLast {
                pattern: pattern.to_string(),
            });
        }
        let segment = Segment::parse(raw);
        if segment == Segment::Named("") {
            return Err(RouteError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "parameter name must not be empty",
            });
        }
        segments.push(segment);
    }
    Ok(segments)
}

/// Split a request path into literal segments.
///
/// Empty segments are dropped. Collection stops after a `*`-prefixed
/// segment since a wildcard swallows whatever follows it.
pub fn split_path(path: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for item in path.split('/').filter(|s| !s.is_empty()) {
        parts.push(item);
        if item.starts_with('*') {
            break;
        }
    }
    parts
}
