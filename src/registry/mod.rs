//! # Registry Module
//!
//! The candidate registry holds every handler that may serve a given route template and
//! HTTP method. Several candidates may share the same route + method; the
//! [`dispatcher`](crate::dispatcher) resolver picks one per request from their header
//! constraints.
//!
//! ## Lifecycle
//!
//! 1. **Composition** - candidates are registered at startup, from code or from a
//!    [`manifest`](crate::manifest). Malformed declarations abort composition.
//! 2. **Serving** - the registry is read-only; lookups borrow and never lock.
//! 3. **Reload** - [`hot_reload`](crate::hot_reload) builds a *new* registry and swaps the
//!    [`SharedRegistry`] pointer. Existing registries are never mutated.
//!
//! ## Example
//!
//! ```
//! use brrtconneg::constraint::HeaderMatchConstraint;
//! use brrtconneg::registry::{Candidate, CandidateRegistry};
//! use http::Method;
//!
//! # fn main() -> Result<(), brrtconneg::ConnegError> {
//! let route = "/authors/{authorId}/books/{bookId}";
//! let mut registry = CandidateRegistry::new();
//! registry.register(
//!     route,
//!     Method::GET,
//!     Candidate::new("get_book").with_constraint(HeaderMatchConstraint::new(
//!         "Accept",
//!         ["application/json", "application/vnd.marvin.book+json"],
//!     )?),
//! )?;
//! registry.register(route, Method::GET, Candidate::new("get_book_fallback"))?;
//!
//! assert_eq!(registry.lookup(route, &Method::GET).len(), 2);
//! assert!(registry.lookup(route, &Method::POST).is_empty());
//! # Ok(())
//! # }
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use self::core::{
    parse_method, shared, Candidate, CandidateRegistry, HandlerId, SharedRegistry,
    SUPPORTED_METHODS,
};
