//! # Constraint Module
//!
//! A [`HeaderMatchConstraint`] binds a request header (usually `Accept` or
//! `Content-Type`) to the set of media types a handler is willing to serve.
//!
//! Constraints are compiled once at startup from declarative route metadata and are
//! immutable afterwards, so a single instance is shared by every concurrent request.
//!
//! ```
//! use brrtconneg::constraint::HeaderMatchConstraint;
//! use http::{header::ACCEPT, HeaderMap, HeaderValue};
//!
//! let constraint = HeaderMatchConstraint::new(
//!     "Accept",
//!     ["application/json", "application/vnd.marvin.book+json"],
//! )
//! .unwrap();
//!
//! let mut headers = HeaderMap::new();
//! headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.marvin.book+json"));
//! assert!(constraint.accepts(&headers));
//! assert!(!constraint.accepts(&HeaderMap::new()));
//! ```

use http::header::{HeaderMap, HeaderName};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::error::ConnegError;
use crate::media_type::{
    parse_media_type_list, MalformedMediaType, MediaType, RequestMediaTypes, Specificity,
};

/// Ordered media types declared by one constraint. Duplicates are tolerated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediaTypeSet(Vec<MediaType>);

impl MediaTypeSet {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse every raw string, failing on the first malformed one.
    ///
    /// # Errors
    ///
    /// Returns the [`MalformedMediaType`] of the first entry that does not parse.
    pub fn parse<I, S>(raw: I) -> Result<Self, MalformedMediaType>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .map(|s| MediaType::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn push(&mut self, media_type: MediaType) {
        self.0.push(media_type);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MediaType> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest specificity among declared types matched by any requested type.
    #[must_use]
    pub fn best_match(&self, requested: &[MediaType]) -> Option<Specificity> {
        self.0
            .iter()
            .filter(|declared| requested.iter().any(|r| r.is_subset_of(declared)))
            .map(MediaType::specificity)
            .max()
    }
}

impl FromIterator<MediaType> for MediaTypeSet {
    fn from_iter<T: IntoIterator<Item = MediaType>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MediaTypeSet {
    type Item = &'a MediaType;
    type IntoIter = std::slice::Iter<'a, MediaType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for MediaTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, media_type) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{media_type}")?;
        }
        Ok(())
    }
}

/// Requires `header` to carry at least one media type within `media_types`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatchConstraint {
    header: HeaderName,
    media_types: MediaTypeSet,
}

impl HeaderMatchConstraint {
    /// Compile a constraint from a header name and one or more media type strings.
    ///
    /// # Errors
    ///
    /// Fails on an invalid header name, an empty media type list, or any malformed
    /// media type. Callers are expected to abort startup on error.
    pub fn new<I, S>(header: &str, media_types: I) -> Result<Self, ConnegError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = HeaderName::from_bytes(header.trim().as_bytes())
            .map_err(|_| ConnegError::InvalidHeaderName(header.to_string()))?;
        let media_types = MediaTypeSet::parse(media_types)?;
        Self::from_parts(name, media_types)
    }

    /// Build from already parsed parts.
    ///
    /// # Errors
    ///
    /// Returns [`ConnegError::EmptyMediaTypeSet`] when `media_types` is empty.
    pub fn from_parts(header: HeaderName, media_types: MediaTypeSet) -> Result<Self, ConnegError> {
        if media_types.is_empty() {
            return Err(ConnegError::EmptyMediaTypeSet(header.to_string()));
        }
        Ok(Self {
            header,
            media_types,
        })
    }

    #[inline]
    #[must_use]
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    #[inline]
    #[must_use]
    pub fn media_types(&self) -> &MediaTypeSet {
        &self.media_types
    }

    /// Evaluate the constraint against a request's headers.
    ///
    /// False when the header is absent or none of its parseable entries match.
    #[must_use]
    pub fn accepts(&self, headers: &HeaderMap) -> bool {
        self.evaluate(headers).is_some()
    }

    /// Like [`accepts`](Self::accepts) but reports the specificity of the best
    /// matching declared type.
    #[must_use]
    pub fn evaluate(&self, headers: &HeaderMap) -> Option<Specificity> {
        let requested = request_media_types(headers, &self.header)?;
        self.best_match(&requested)
    }

    /// Evaluate against media types already parsed from the constraint's header.
    #[must_use]
    pub fn best_match(&self, requested: &[MediaType]) -> Option<Specificity> {
        self.media_types.best_match(requested)
    }
}

impl fmt::Display for HeaderMatchConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.header, self.media_types)
    }
}

/// Parse every value of `name` into media types.
///
/// `None` when the header is absent; an empty list when it is present but nothing in
/// it parses. Values that are not visible ASCII are skipped.
#[must_use]
pub fn request_media_types(headers: &HeaderMap, name: &HeaderName) -> Option<RequestMediaTypes> {
    let mut values = headers.get_all(name).iter().peekable();
    values.peek()?;

    let mut parsed = RequestMediaTypes::new();
    for value in values {
        match value.to_str() {
            Ok(raw) => parse_media_type_list(raw, &mut parsed),
            Err(_) => debug!(header = %name, "Skipping non-ASCII header value"),
        }
    }
    Some(parsed)
}
