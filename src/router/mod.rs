//! # Router Module
//!
//! Compiles a [`Specification`](crate::spec::Specification) into a [`RouteTable`] and
//! matches incoming requests against it.
//!
//! ## Architecture
//!
//! 1. **Compilation**: resources are walked depth-first. Each resource path is split into
//!    segments (literal or `{name}`) and inserted into a segment radix tree; each declared
//!    method becomes one [`RouteEntry`] on the terminal node. Collisions and ambiguous
//!    templates are rejected with [`CompileError`](crate::error::CompileError).
//!
//! 2. **Matching**: the request path is normalized (`//` collapsed, trailing `/` removed),
//!    split, percent-decoded and walked through the tree. Literal children are tried before
//!    the template child, so `/products/featured` beats `/products/{productID}`.
//!
//! A lookup has three outcomes, see [`RouteLookup`]:
//!
//! | Outcome | Meaning |
//! |---|---|
//! | `Matched` | route found, path parameters captured |
//! | `MethodNotAllowed(set)` | the path exists for other verbs only |
//! | `NotFound` | no pattern matches the path |
//!
//! ## Example
//!
//! ```rust,ignore
//! use ramlrouter::router::{RouteLookup, RouteTable};
//! use http::Method;
//!
//! let table = RouteTable::compile(&spec)?;
//! if let RouteLookup::Matched(m) = table.lookup(&Method::GET, "/products/42") {
//!     assert_eq!(m.path_param("productID"), Some("42"));
//! }
//! ```
//!
//! The table is never mutated after `compile`, so it is shared across request coroutines
//! behind an `Arc` without locking.

mod core;
mod method_set;
mod radix;
#[cfg(test)]
mod tests;

pub use core::{normalize_path, ParamRule, RouteEntry, RouteLookup, RouteMatch, RouteTable};
pub use method_set::MethodSet;
