//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (before serving):
//!     (method, pattern, handler)
//!     → pattern.rs (split into Static / Named / Wildcard segments)
//!     → trie.rs (insert into the method's prefix tree, detect conflicts)
//!     → router.rs (remember handler under (method, pattern))
//!
//! Request time (read-only):
//!     (method, path)
//!     → pattern.rs (split path into literal segments)
//!     → trie.rs (depth-first search for a terminal node)
//!     → router.rs (recover handler, extract parameters)
//!     → Return: RouteMatch or None
//! ```
//!
//! # Design Decisions
//! - One trie root per HTTP method
//! - Shared prefixes are reused; only two routes ending on the same node conflict
//! - Literal children are tried before parameterized ones, insertion order otherwise
//! - A miss is `None`, never an error

pub mod error;
pub mod pattern;
pub mod router;
pub mod trie;

pub use error::{BuildError, RouteError};
pub use pattern::Segment;
pub use router::{Params, RouteMatch, Router};
