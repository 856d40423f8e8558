//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum/hyper, request ID, timeout, body buffering)
//!     → request.rs (transport-independent Request)
//!     → [app::Dispatcher builds the chain]
//!     → context.rs (handlers read the request, write the response)
//!     → response.rs (buffered Response → axum response)
//!     → Send to client
//! ```

pub mod context;
pub mod render;
pub mod request;
pub mod response;
pub mod server;

pub use context::{BindError, Context};
pub use render::{RenderError, TemplateEngine};
pub use request::{Request, UuidRequestId, X_REQUEST_ID};
pub use response::Response;
pub use server::{HttpServer, ServerError};
