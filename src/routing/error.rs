//! Route registration errors.

use axum::http::Method;
use thiserror::Error;

/// A route that cannot be added to the table.
///
/// These are configuration errors: they are reported while the application
/// is being built and prevent it from being sealed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    #[error("wildcard must be the last segment in {pattern:?}")]
    WildcardNotLast { pattern: String },

    #[error("route conflict for {method}: {pattern:?} collides with {existing:?}")]
    Conflict {
        method: Method,
        pattern: String,
        existing: String,
    },

    #[error("route {method} {pattern:?} registered twice")]
    Duplicate { method: Method, pattern: String },
}

/// Every registration error collected while building an application.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} route registration error(s): {}", .errors.len(), join(.errors))]
pub struct BuildError {
    pub errors: Vec<RouteError>,
}

fn join(errors: &[RouteError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_lists_every_cause() {
        let err = BuildError {
            errors: vec![
                RouteError::Duplicate {
                    method: Method::GET,
                    pattern: "/a".into(),
                },
                RouteError::WildcardNotLast {
                    pattern: "/*x/y".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 route registration error(s)"));
        assert!(msg.contains("\"/a\""));
        assert!(msg.contains("\"/*x/y\""));
    }
}
