//! # Media Type Module
//!
//! Parsing and comparison of MIME-style media types as they appear in `Accept` and
//! `Content-Type` headers and in declared handler constraints.
//!
//! ## Overview
//!
//! A media type is `type/subtype` followed by optional `;key=value` parameters:
//!
//! ```text
//! application/vnd.marvin.book+json; charset=utf-8
//! └────┬────┘ └─────────┬────────┘  └─────┬─────┘
//!     type           subtype          parameter
//!                 (suffix = json)
//! ```
//!
//! Wildcards are accepted as `*/*`, `type/*` and `type/*+suffix`.
//!
//! ## Matching
//!
//! [`matches`] answers "does the requested type satisfy the declared one?". Only the
//! declared side may widen the match:
//!
//! | requested                          | declared               | result |
//! |------------------------------------|------------------------|--------|
//! | `application/json`                 | `application/json`     | ✅     |
//! | `application/vnd.x+json`           | `application/*`        | ✅     |
//! | `application/vnd.x+json`           | `application/*+json`   | ✅     |
//! | `application/json;a=1;b=2`         | `application/json;a=1` | ✅     |
//! | `application/json;a=1`             | `application/json;a=1;b=2` | ❌ |
//! | `application/*`                    | `application/json`     | ❌     |
//!
//! Declared types additionally expose a [`Specificity`] which the resolver uses to
//! rank several eligible candidates.
//!
//! ## Error Handling
//!
//! [`MediaType::parse`] returns [`MalformedMediaType`]. Declared types are parsed at
//! startup so a bad string aborts composition; request entries are parsed with
//! [`parse_media_type_list`], which silently drops anything it cannot read.

mod core;
mod list;

pub use self::core::{
    matches, MalformedMediaType, MalformedReason, MediaParamVec, MediaType, Specificity,
    MAX_INLINE_MEDIA_PARAMS,
};
pub use self::list::{
    parse_media_type_list, parse_media_types, RequestMediaTypes, MAX_INLINE_REQUEST_TYPES,
};
