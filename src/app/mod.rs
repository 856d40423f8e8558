//! Application assembly and request dispatch.
//!
//! # Lifecycle
//! ```text
//! Build phase (single-threaded, before serving):
//!     Application::new()
//!     → group() / use_middleware() / get() / post() / static_files()
//!     → seal()  ── any registration error → BuildError, nothing is served
//!
//! Serve phase (concurrent, read-only):
//!     Dispatcher::dispatch(Request)
//!     → collect middleware of every group whose prefix matches the path
//!     → resolve route (or fall back to the not-found handler)
//!     → Context::next() drives the chain
//!     → Response
//! ```
//!
//! # Design Decisions
//! - `seal` consumes the builder; a `Dispatcher` has no registration API
//! - Groups are flattened into one ordered list when created
//! - Middleware scoping is a plain textual prefix test at dispatch time

pub mod application;
pub mod dispatcher;
pub mod handler;
pub mod static_files;

pub use application::{Application, RouterGroup};
pub use dispatcher::Dispatcher;
pub use handler::HandlerFunc;
