//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events:
//!     routing/app → registration (info), dispatch (debug)
//!     http        → transport spans (TraceLayer), body/worker errors
//!     middleware  → per-request access lines, recovered panics
//!     → logging.rs subscriber (stdout, pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured fields, not formatted strings
//! - Request ID attached by the transport and logged by `middleware::logger`

pub mod logging;

pub use logging::init_logging;
