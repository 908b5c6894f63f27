//! Media type values - parsing, formatting and declared/requested matching.
//!
//! Parsing is done once per declared constraint at startup and once per header entry
//! per request. Parameters are stored inline for the common case (≤4 parameters).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt::{self, Write};
use std::str::FromStr;
use thiserror::Error;

use super::list::split_unquoted;

/// Maximum number of media type parameters before heap allocation.
pub const MAX_INLINE_MEDIA_PARAMS: usize = 4;

/// Parameter storage: lowercased key, raw (unquoted) value, in declaration order.
pub type MediaParamVec = SmallVec<[(String, String); MAX_INLINE_MEDIA_PARAMS]>;

/// Why a media type string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    Empty,
    MissingSlash,
    EmptyType,
    EmptySubtype,
    InvalidType,
    InvalidSubtype,
    /// `*/json` - a wildcard type requires a wildcard subtype
    WildcardType,
    InvalidParameter,
    DuplicateParameter,
    UnterminatedQuote,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MalformedReason::Empty => "empty value",
            MalformedReason::MissingSlash => "missing '/' between type and subtype",
            MalformedReason::EmptyType => "empty type",
            MalformedReason::EmptySubtype => "empty subtype",
            MalformedReason::InvalidType => "type is not a valid token",
            MalformedReason::InvalidSubtype => "subtype is not a valid token",
            MalformedReason::WildcardType => "wildcard type requires a wildcard subtype",
            MalformedReason::InvalidParameter => "parameter is not of the form key=value",
            MalformedReason::DuplicateParameter => "parameter declared twice",
            MalformedReason::UnterminatedQuote => "unterminated quoted string",
        };
        f.write_str(s)
    }
}

/// A media type string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed media type `{input}`: {reason}")]
pub struct MalformedMediaType {
    /// The raw input as supplied
    pub input: String,
    pub reason: MalformedReason,
}

/// Ranking of a declared media type, used to break ties between candidates.
///
/// Ordered lexicographically: a concrete type/subtype always outranks a wildcard,
/// and among equally concrete types the one with more parameters wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Specificity {
    /// 1 for a concrete type, plus 0 / 1 / 2 for subtype `*` / `*+suffix` / exact
    pub concreteness: u16,
    /// Number of declared parameters
    pub parameters: u16,
}

/// A parsed `type/subtype[;key=value]*` value.
///
/// `type`, `subtype` and parameter keys are lowercased at parse time. Parameter
/// values keep their case and compare case-insensitively.
#[derive(Debug, Clone)]
pub struct MediaType {
    ty: String,
    subtype: String,
    params: MediaParamVec,
}

impl MediaType {
    /// Parse a single media type.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedMediaType`] when either side of the `/` is empty or not a
    /// token, when a wildcard type carries a concrete subtype, or when the parameter
    /// list is not a sequence of `;key=value` pairs.
    ///
    /// # Example
    ///
    /// ```
    /// use brrtconneg::media_type::MediaType;
    ///
    /// let mt = MediaType::parse("application/vnd.marvin.book+json; charset=UTF-8").unwrap();
    /// assert_eq!(mt.subtype(), "vnd.marvin.book+json");
    /// assert_eq!(mt.suffix(), Some("json"));
    /// assert_eq!(mt.param("charset"), Some("UTF-8"));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, MalformedMediaType> {
        Self::parse_inner(raw).map_err(|reason| MalformedMediaType {
            input: raw.to_string(),
            reason,
        })
    }

    fn parse_inner(raw: &str) -> Result<Self, MalformedReason> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(MalformedReason::Empty);
        }

        let segments = split_unquoted(input, ';')?;
        let (essence, rest) = segments.split_first().ok_or(MalformedReason::Empty)?;

        let (ty, subtype) = essence
            .split_once('/')
            .ok_or(MalformedReason::MissingSlash)?;
        let (ty, subtype) = (ty.trim(), subtype.trim());
        if ty.is_empty() {
            return Err(MalformedReason::EmptyType);
        }
        if subtype.is_empty() {
            return Err(MalformedReason::EmptySubtype);
        }
        if !is_valid_type(ty) {
            return Err(MalformedReason::InvalidType);
        }
        if !is_valid_subtype(subtype) {
            return Err(MalformedReason::InvalidSubtype);
        }
        if ty == "*" && subtype != "*" {
            return Err(MalformedReason::WildcardType);
        }

        let mut params = MediaParamVec::new();
        for segment in rest {
            let segment = segment.trim();
            // `text/html;` is common enough in the wild to tolerate
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment
                .split_once('=')
                .ok_or(MalformedReason::InvalidParameter)?;
            let (key, value) = (key.trim(), value.trim());
            if !is_token(key) {
                return Err(MalformedReason::InvalidParameter);
            }
            let value = if value.starts_with('"') {
                unquote(value).ok_or(MalformedReason::InvalidParameter)?
            } else if is_token(value) {
                value.to_string()
            } else {
                return Err(MalformedReason::InvalidParameter);
            };
            let key = key.to_ascii_lowercase();
            if params.iter().any(|(k, _)| *k == key) {
                return Err(MalformedReason::DuplicateParameter);
            }
            params.push((key, value));
        }

        Ok(Self {
            ty: ty.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            params,
        })
    }

    /// The top-level type (`application` in `application/json`)
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.ty
    }

    #[inline]
    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Structured syntax suffix: `json` for `vnd.marvin.book+json` and for `*+json`.
    #[must_use]
    pub fn suffix(&self) -> Option<&str> {
        self.subtype
            .rsplit_once('+')
            .map(|(_, suffix)| suffix)
            .filter(|suffix| !suffix.is_empty())
    }

    /// Get a parameter value by (case-insensitive) key
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True when the type or subtype carries a wildcard (`*/*`, `text/*`, `application/*+json`)
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.ty == "*" || self.subtype == "*" || self.subtype.starts_with("*+")
    }

    /// The `q` parameter, when present and numeric.
    #[must_use]
    pub fn quality(&self) -> Option<f32> {
        self.param("q").and_then(|q| q.trim().parse::<f32>().ok())
    }

    /// `q=0` marks an entry of an `Accept`-style list as explicitly not acceptable.
    #[must_use]
    pub fn is_refused(&self) -> bool {
        self.quality().is_some_and(|q| q <= 0.0)
    }

    /// Whether this (requested) media type falls within `declared`.
    ///
    /// The relation is asymmetric: wildcards and parameters are only honoured on the
    /// declared side. A declared type without parameters ignores requested parameters;
    /// otherwise every declared parameter must be present with an equal value.
    #[must_use]
    pub fn is_subset_of(&self, declared: &MediaType) -> bool {
        let type_ok = declared.ty == "*" || declared.ty == self.ty;
        type_ok
            && self.subtype_within(declared)
            && declared.params.iter().all(|(key, value)| {
                self.param(key)
                    .is_some_and(|mine| mine.eq_ignore_ascii_case(value))
            })
    }

    fn subtype_within(&self, declared: &MediaType) -> bool {
        if declared.subtype == "*" || declared.subtype == self.subtype {
            return true;
        }
        match declared.subtype.strip_prefix("*+") {
            Some(suffix) => self.suffix() == Some(suffix),
            None => false,
        }
    }

    /// Rank used when this value is a declared constraint type.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        let type_rank = u16::from(self.ty != "*");
        let subtype_rank = if self.subtype == "*" {
            0
        } else if self.subtype.starts_with("*+") {
            1
        } else {
            2
        };
        Specificity {
            concreteness: type_rank + subtype_rank,
            parameters: u16::try_from(self.params.len()).unwrap_or(u16::MAX),
        }
    }
}

/// Does `requested` satisfy `declared`? See [`MediaType::is_subset_of`].
#[inline]
#[must_use]
pub fn matches(requested: &MediaType, declared: &MediaType) -> bool {
    requested.is_subset_of(declared)
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        // Keys are unique, so equal length + containment is set equality
        self.ty == other.ty
            && self.subtype == other.subtype
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .all(|(k, v)| other.param(k).is_some_and(|o| o.eq_ignore_ascii_case(v)))
    }
}

impl Eq for MediaType {}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ty, self.subtype)?;
        for (key, value) in &self.params {
            if is_token(value) {
                write!(f, ";{key}={value}")?;
            } else {
                write!(f, ";{key}=\"")?;
                for c in value.chars() {
                    if c == '"' || c == '\\' {
                        f.write_char('\\')?;
                    }
                    f.write_char(c)?;
                }
                f.write_char('"')?;
            }
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = MalformedMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::parse(s)
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MediaType::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// RFC 7230 `tchar`
#[inline]
fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}

pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_tchar)
}

fn is_valid_type(s: &str) -> bool {
    s == "*" || (is_token(s) && !s.contains('*'))
}

fn is_valid_subtype(s: &str) -> bool {
    if s == "*" {
        return true;
    }
    if let Some(suffix) = s.strip_prefix("*+") {
        return is_token(suffix) && !suffix.contains('*');
    }
    is_token(s) && !s.contains('*')
}

/// Strip the surrounding quotes of a quoted-string and resolve `\` escapes.
fn unquote(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next()?),
            '"' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}
