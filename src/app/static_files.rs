//! Static directory serving.
//!
//! Registered as `GET <relative>/*filepath`; the wildcard value is resolved
//! below the configured root directory. The value arrives percent-decoded,
//! so encoded `..` components are rejected like literal ones.

use std::fs;
use std::path::{Component, Path, PathBuf};

use axum::http::StatusCode;

use crate::http::Context;

/// Handler serving files below `root`.
pub(crate) fn serve_dir(root: PathBuf) -> impl Fn(&mut Context) + Send + Sync + 'static {
    move |c: &mut Context| {
        let Some(path) = c.param("filepath").and_then(|file| resolve_below(&root, file)) else {
            not_found(c);
            return;
        };

        match fs::read(&path) {
            Ok(bytes) => {
                c.set_header("Content-Type", content_type(&path));
                c.data(StatusCode::OK, bytes);
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Static file not served");
                not_found(c);
            }
        }
    }
}

fn not_found(c: &mut Context) {
    c.string(StatusCode::NOT_FOUND, "404 page not found\n");
}

/// Join `file` onto `root`, refusing anything but plain path components.
fn resolve_below(root: &Path, file: &str) -> Option<PathBuf> {
    let relative = Path::new(file);
    if relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        Some(root.join(relative))
    } else {
        None
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}
