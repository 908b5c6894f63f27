//! # Dispatcher Module
//!
//! The dispatcher module turns "a request for route R with method M" into "run handler H".
//! Several handlers may be bound to the same route and method; the resolver decides
//! between them from the request's headers, and the dispatcher runs the winner.
//!
//! ## Overview
//!
//! - [`resolve`] - the pure selection algorithm over a [`CandidateRegistry`](crate::registry::CandidateRegistry)
//! - [`Dispatcher`] - handler table + resolve + invoke, with panic recovery
//! - [`no_match_status`] - the HTTP status for each [`NoMatch`] reason
//!
//! ## Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant HTTP as HTTP layer
//!     participant Disp as Dispatcher
//!     participant Res as resolve()
//!     participant Reg as CandidateRegistry
//!     participant H as Handler
//!
//!     HTTP->>Disp: IncomingRequest (route, method, headers)
//!     Disp->>Res: resolve(route, method, headers)
//!     Res->>Reg: lookup(route, method)
//!     Reg-->>Res: candidates (registration order)
//!     Res->>Res: evaluate constraints (all must hold)
//!     Res->>Res: rank eligible by specificity, else fallback
//!     alt Selected
//!         Res-->>Disp: Selection
//!         Disp->>H: HandlerRequest
//!         H-->>Disp: HandlerResponse
//!     else NoMatch
//!         Res-->>Disp: NoMatch reason
//!         Disp-->>HTTP: 404 / 405 / 406
//!     end
//!     Disp-->>HTTP: HandlerResponse
//! ```
//!
//! ## Error Handling
//!
//! - No eligible candidate: 404 (unknown route), 405 (other methods only, with `Allow`),
//!   406 (constraints unsatisfied)
//! - Selected handler never registered: 500, logged as critical
//! - Handler panics are caught and return 500 responses
//!
//! ## Concurrency
//!
//! `resolve` takes the registry by shared reference and holds no locks. The dispatcher
//! reads the registry through an `ArcSwap`, so a hot reload never blocks a request.

mod core;
mod resolver;

pub use self::core::{
    no_match_status, Dispatcher, HandlerFn, HandlerRequest, HandlerResponse, HeaderVec,
    IncomingRequest, MAX_INLINE_HEADERS, REQUEST_ID_HEADER,
};
pub use self::resolver::{resolve, NoMatch, Resolution, Selection, SelectionKind};
