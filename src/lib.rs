//! Minimal HTTP framework: trie routing, scoped middleware, handler chains.
//!
//! ```no_run
//! use ox_web::{Application, StatusCode};
//! use serde_json::json;
//!
//! let mut app = Application::new();
//! app.use_middleware(ox_web::middleware::logger());
//! app.get("/", |c| c.json(StatusCode::OK, &json!({ "message": "go" })));
//!
//! let mut api = app.group("/api");
//! api.get("/user/:id", |c| {
//!     let id = c.param("id").unwrap_or_default().to_string();
//!     c.string(StatusCode::OK, format_args!("user {}", id));
//! });
//!
//! let dispatcher = app.seal().expect("route table is unambiguous");
//! ```

pub mod app;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod routing;

pub use app::{Application, Dispatcher, HandlerFunc, RouterGroup};
pub use axum::http::{Method, StatusCode};
pub use config::AppConfig;
pub use http::{Context, HttpServer, Request, Response};
pub use lifecycle::Shutdown;
