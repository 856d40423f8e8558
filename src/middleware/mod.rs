//! Built-in middleware.
//!
//! Both are ordinary handlers: register them with `use_middleware` on the
//! application or on a group.
//!
//! ```text
//! recovery → logger → ...group middleware... → route handler
//! ```

pub mod logger;
pub mod recovery;

pub use logger::logger;
pub use recovery::recovery;
