//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging → Build application → seal() → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Shutdown::trigger → server stops accepting → in-flight requests drain
//!
//! Signals (signals.rs):
//!     SIGTERM / Ctrl+C → resolve `shutdown_signal()`
//! ```
//!
//! # Design Decisions
//! - Fail fast: a configuration or route registration error aborts startup
//! - The listener is bound last, after the application is sealed

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
