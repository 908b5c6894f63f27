//! # brrtconneg
//!
//! **brrtconneg** selects exactly one handler for a request when several handlers are
//! bound to the same route template and HTTP method, based on the media types the
//! request declares in its headers (`Accept`, `Content-Type`, or any other header).
//!
//! ## Overview
//!
//! A REST API versioned through vendor media types binds several handlers to one
//! endpoint:
//!
//! | Route | Method | Constraint | Handler |
//! |-------|--------|------------|---------|
//! | `/authors/{authorId}/books/{bookId}` | GET | `Accept: application/json, application/vnd.marvin.book+json` | `get_book` |
//! | `/authors/{authorId}/books/{bookId}` | GET | `Accept: application/vnd.marvin.bookwithconcatenatedauthorname+json` | `get_book_with_concatenated_author_name` |
//! | `/authors/{authorId}/books` | POST | `Content-Type: application/vnd.marvin.bookforcreationwithamountofpages+json` | `create_book_with_amount_of_pages` |
//!
//! The engine decides which of them serves a given request, or why none can.
//!
//! ## Architecture
//!
//! - **[`media_type`]** - parsing and asymmetric matching of `type/subtype;params` values
//! - **[`constraint`]** - [`MediaTypeSet`] and [`HeaderMatchConstraint`], a predicate over request headers
//! - **[`registry`]** - [`CandidateRegistry`] keyed by route template and method, in registration order
//! - **[`dispatcher`]** - the [`resolve`](dispatcher::resolve) algorithm and a [`Dispatcher`] that runs handlers
//! - **[`manifest`]** - YAML/JSON route manifests compiled into a registry
//! - **[`hot_reload`]** - manifest watching with atomic registry swaps
//! - **[`logging`]**, **[`runtime_config`]** - `tracing` setup and environment configuration
//! - **[`cli`]** - the `conneg` binary: validate, inspect, resolve, watch
//!
//! ### Resolution Flow
//!
//! ```mermaid
//! flowchart TD
//!     A[route + method + headers] --> B{candidates registered?}
//!     B -- none, route unknown --> N1[NoMatch: UnknownRoute / 404]
//!     B -- none, other methods --> N2[NoMatch: MethodNotAllowed / 405]
//!     B -- yes --> C[evaluate constrained candidates]
//!     C --> D{eligible?}
//!     D -- one --> S[Selected]
//!     D -- several --> E[highest specificity, then earliest registered] --> S
//!     D -- none --> F{fallback registered?}
//!     F -- yes --> S
//!     F -- no --> N3[NoMatch: Unsatisfied / 406]
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use brrtconneg::{Candidate, CandidateRegistry, HeaderMatchConstraint};
//! use http::header::{HeaderMap, HeaderValue, ACCEPT};
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
//! registry.register(
//!     route,
//!     Method::GET,
//!     Candidate::new("get_book_with_concatenated_author_name").with_constraint(
//!         HeaderMatchConstraint::new(
//!             "Accept",
//!             ["application/vnd.marvin.bookwithconcatenatedauthorname+json"],
//!         )?,
//!     ),
//! )?;
//!
//! let mut headers = HeaderMap::new();
//! headers.insert(
//!     ACCEPT,
//!     HeaderValue::from_static("application/vnd.marvin.bookwithconcatenatedauthorname+json"),
//! );
//! let resolution = registry.resolve(route, &Method::GET, &headers);
//! assert_eq!(
//!     resolution.handler().map(|h| h.as_str()),
//!     Some("get_book_with_concatenated_author_name")
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! The registry is built once and then only read; [`resolve`](dispatcher::resolve) is a
//! pure function of the registry and the request. Any number of threads may resolve
//! concurrently. Reloads build a new registry and swap it in through
//! [`SharedRegistry`](registry::SharedRegistry).

pub mod cli;
pub mod constraint;
pub mod dispatcher;
pub mod error;
pub mod hot_reload;
pub mod ids;
pub mod logging;
pub mod manifest;
pub mod media_type;
pub mod registry;
pub mod runtime_config;

pub use constraint::{HeaderMatchConstraint, MediaTypeSet};
pub use dispatcher::{Dispatcher, NoMatch, Resolution, Selection, SelectionKind};
pub use error::ConnegError;
pub use manifest::{load_manifest, load_registry, Manifest};
pub use media_type::{MalformedMediaType, MediaType, Specificity};
pub use registry::{Candidate, CandidateRegistry, HandlerId, SharedRegistry};
