//! Access logging middleware.

use std::time::Instant;

use crate::http::Context;

/// Log one line per request once the rest of the chain has run.
pub fn logger() -> impl Fn(&mut Context) + Send + Sync + 'static {
    |c: &mut Context| {
        let start = Instant::now();
        c.next();

        let status = c.status_code().as_u16();
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            method = %c.method(),
            path = %c.path(),
            status,
            elapsed_ms,
            request_id = c.request_id().unwrap_or("-"),
            aborted = c.is_aborted(),
            "Request completed"
        );
    }
}
