//! Handler type shared by routes and middleware.

use std::sync::Arc;

use axum::http::StatusCode;

use crate::http::Context;

/// A route handler or middleware.
///
/// Middleware call `Context::next()` to continue the chain; a route handler
/// normally writes the response and returns.
pub type HandlerFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Terminal handler used when no route matches.
pub(crate) fn not_found() -> HandlerFunc {
    Arc::new(|c: &mut Context| {
        let body = format!("404 NOT FOUND: {}\n", c.path());
        c.string(StatusCode::NOT_FOUND, body);
    })
}
