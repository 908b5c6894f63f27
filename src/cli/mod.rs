//! # CLI Module
//!
//! Command-line tooling around route manifests: check them, list what they compile to,
//! and try resolutions without running a service.
//!
//! ## Commands
//!
//! ### `validate`
//!
//! Report every problem in a manifest; exits non-zero if there is any:
//!
//! ```bash
//! conneg validate --manifest demos/library.yaml
//! ```
//!
//! ### `inspect`
//!
//! List routes, methods, candidates and their constraints in registration order:
//!
//! ```bash
//! conneg inspect --manifest demos/library.yaml
//! ```
//!
//! ### `resolve`
//!
//! Resolve one request and print the selected handler, or the no-match reason with
//! the HTTP status it maps to:
//!
//! ```bash
//! conneg resolve --manifest demos/library.yaml \
//!     --method GET --route '/api/v1/authors/{authorId}/books/{bookId}' \
//!     -H 'Accept: application/vnd.marvin.bookwithconcatenatedauthorname+json'
//! ```
//!
//! ### `watch`
//!
//! Load the manifest and keep reloading it on change, logging each swap:
//!
//! ```bash
//! CONNEG_LOG_FORMAT=pretty conneg watch --manifest demos/library.yaml
//! ```
//!
//! Every `--manifest` flag falls back to `CONNEG_MANIFEST`.
//!
//! ## Usage from Code
//!
//! ```rust,no_run
//! use brrtconneg::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! # fn main() -> anyhow::Result<()> {
//! run_cli(Cli::parse())?;
//! # Ok(())
//! # }
//! ```

mod commands;


pub use self::commands::{describe_resolution, parse_header_arg, run_cli, Cli, Commands};
