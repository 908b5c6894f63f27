use thiserror::Error;

use crate::media_type::MalformedMediaType;

/// Errors raised while composing constraints and the candidate registry.
///
/// All of these are startup-time configuration errors: request evaluation never
/// produces a `ConnegError`.
#[derive(Debug, Error)]
pub enum ConnegError {
    #[error(transparent)]
    MalformedMediaType(#[from] MalformedMediaType),

    #[error("invalid header name `{0}`")]
    InvalidHeaderName(String),

    #[error("constraint on header `{0}` declares no media types")]
    EmptyMediaTypeSet(String),

    #[error("unsupported HTTP method `{0}`")]
    InvalidMethod(String),

    /// Route templates must be non-empty and start with `/`
    #[error("invalid route template `{0}`")]
    InvalidRoute(String),

    #[error("handler name must not be empty")]
    EmptyHandler,

    #[error("handler `{handler}` is already registered for {method} {route}")]
    DuplicateCandidate {
        route: String,
        method: String,
        handler: String,
    },
}

impl ConnegError {
    /// Short machine-readable classification, used when reporting manifest issues.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ConnegError::MalformedMediaType(_) => "MalformedMediaType",
            ConnegError::InvalidHeaderName(_) => "InvalidHeaderName",
            ConnegError::EmptyMediaTypeSet(_) => "EmptyMediaTypes",
            ConnegError::InvalidMethod(_) => "InvalidMethod",
            ConnegError::InvalidRoute(_) => "InvalidRoute",
            ConnegError::EmptyHandler => "MissingHandler",
            ConnegError::DuplicateCandidate { .. } => "DuplicateCandidate",
        }
    }
}
