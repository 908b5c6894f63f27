//! # Route Manifest
//!
//! Declarative description of routes, their candidate handlers and header constraints,
//! compiled into a [`CandidateRegistry`] at startup (and on every hot reload).
//!
//! ## Format
//!
//! YAML (`.yaml` / `.yml`) or JSON (anything else):
//!
//! ```yaml
//! base_path: /api/v1
//! routes:
//!   - path: /authors/{authorId}/books/{bookId}
//!     method: GET
//!     handler: get_book
//!     constraints:
//!       - header: Accept
//!         media_types: [application/json, application/vnd.marvin.book+json]
//!   - path: /authors/{authorId}/books/{bookId}
//!     method: GET
//!     handler: get_book_with_concatenated_author_name
//!     constraints:
//!       - header: Accept
//!         media_types: [application/vnd.marvin.bookwithconcatenatedauthorname+json]
//! ```
//!
//! Route order in the file is registration order, which decides specificity ties.
//! A route without `constraints` is the fallback for its path and method.
//!
//! ## Checking vs. compiling
//!
//! - [`Manifest::validate`] collects *every* problem, for tooling (`conneg validate`)
//! - [`Manifest::build_registry`] stops at the first problem, for startup

use anyhow::{Context, Result};
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::constraint::HeaderMatchConstraint;
use crate::error::ConnegError;
use crate::registry::{parse_method, Candidate, CandidateRegistry};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Prefix joined to every route path, e.g. `/api/v1`
    #[serde(default)]
    pub base_path: String,
    #[serde(default)]
    pub routes: Vec<RouteDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDecl {
    pub path: String,
    pub method: String,
    pub handler: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintDecl {
    pub header: String,
    pub media_types: Vec<String>,
}

impl ConstraintDecl {
    fn compile(&self) -> Result<HeaderMatchConstraint, ConnegError> {
        HeaderMatchConstraint::new(&self.header, &self.media_types)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Json,
}

impl ManifestFormat {
    /// `.yaml` / `.yml` are YAML, everything else is JSON
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ManifestFormat::Yaml
            }
            _ => ManifestFormat::Json,
        }
    }
}

/// One problem found by [`Manifest::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestIssue {
    /// e.g. `routes[3].constraints[0]`
    pub location: String,
    /// Short classification, e.g. `MalformedMediaType`
    pub kind: String,
    pub message: String,
}

impl ManifestIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ManifestIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }

    fn from_error(location: impl Into<String>, err: &ConnegError) -> Self {
        Self::new(location, err.kind(), err.to_string())
    }
}

/// Print issues to stderr in a human-readable form.
pub fn print_issues(issues: &[ManifestIssue]) {
    eprintln!(
        "\n❌ Route manifest validation failed. {} issue(s) found:\n",
        issues.len()
    );
    for issue in issues {
        eprintln!("[{}] {}: {}", issue.kind, issue.location, issue.message);
    }
    eprintln!("\nPlease fix the manifest before starting the service.\n");
}

impl Manifest {
    /// Full route template of `decl`: `base_path` (without trailing `/`) + `path`.
    #[must_use]
    pub fn full_path(&self, decl: &RouteDecl) -> String {
        let base = self.base_path.trim().trim_end_matches('/');
        let path = decl.path.trim();
        match (base.is_empty(), path.is_empty()) {
            (true, true) => String::new(),
            (true, false) => path.to_string(),
            (false, true) => base.to_string(),
            (false, false) => format!("{base}{path}"),
        }
    }

    /// Collect every issue in the manifest. Empty means [`Manifest::build_registry`]
    /// will succeed.
    #[must_use]
    pub fn validate(&self) -> Vec<ManifestIssue> {
        let mut issues = Vec::new();

        let base = self.base_path.trim();
        if !base.is_empty() && !base.starts_with('/') {
            issues.push(ManifestIssue::new(
                "base_path",
                "InvalidRoute",
                format!("base path `{base}` must start with `/`"),
            ));
        }
        if self.routes.is_empty() {
            issues.push(ManifestIssue::new(
                "routes",
                "EmptyManifest",
                "manifest declares no routes",
            ));
        }

        let mut seen: HashSet<(String, Method, String)> = HashSet::new();
        for (i, decl) in self.routes.iter().enumerate() {
            let location = format!("routes[{i}]");

            if !decl.path.trim().starts_with('/') {
                issues.push(ManifestIssue::from_error(
                    &location,
                    &ConnegError::InvalidRoute(decl.path.clone()),
                ));
            }
            let method = match parse_method(&decl.method) {
                Ok(method) => Some(method),
                Err(err) => {
                    issues.push(ManifestIssue::from_error(&location, &err));
                    None
                }
            };
            if decl.handler.trim().is_empty() {
                issues.push(ManifestIssue::from_error(&location, &ConnegError::EmptyHandler));
            }
            for (j, constraint) in decl.constraints.iter().enumerate() {
                if let Err(err) = constraint.compile() {
                    issues.push(ManifestIssue::from_error(
                        format!("{location}.constraints[{j}]"),
                        &err,
                    ));
                }
            }

            if let Some(method) = method {
                let route = self.full_path(decl);
                let handler = decl.handler.trim().to_string();
                if !seen.insert((route.clone(), method.clone(), handler.clone())) {
                    issues.push(ManifestIssue::from_error(
                        &location,
                        &ConnegError::DuplicateCandidate {
                            route,
                            method: method.to_string(),
                            handler,
                        },
                    ));
                }
            }
        }
        issues
    }

    /// Compile the manifest into a registry, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Any malformed route, method, handler or media type; the error context names the
    /// offending route entry.
    pub fn build_registry(&self) -> Result<CandidateRegistry> {
        let base = self.base_path.trim();
        if !base.is_empty() && !base.starts_with('/') {
            return Err(anyhow::Error::new(ConnegError::InvalidRoute(base.to_string()))
                .context("invalid base_path"));
        }

        let mut registry = CandidateRegistry::new();
        for (i, decl) in self.routes.iter().enumerate() {
            self.register_route(&mut registry, decl).with_context(|| {
                format!(
                    "routes[{i}] {} {} (handler `{}`)",
                    decl.method, decl.path, decl.handler
                )
            })?;
        }
        Ok(registry)
    }

    fn register_route(
        &self,
        registry: &mut CandidateRegistry,
        decl: &RouteDecl,
    ) -> Result<(), ConnegError> {
        if !decl.path.trim().starts_with('/') {
            return Err(ConnegError::InvalidRoute(decl.path.clone()));
        }
        let method = parse_method(&decl.method)?;
        let mut candidate = Candidate::new(decl.handler.trim());
        for constraint in &decl.constraints {
            candidate = candidate.with_constraint(constraint.compile()?);
        }
        registry.register(&self.full_path(decl), method, candidate)
    }
}

/// Parse manifest text in the given format.
///
/// # Errors
///
/// Syntax errors and unknown fields.
pub fn parse_manifest_str(content: &str, format: ManifestFormat) -> Result<Manifest> {
    let manifest: Manifest = match format {
        ManifestFormat::Yaml => {
            serde_yaml::from_str(content).context("failed to parse YAML manifest")?
        }
        ManifestFormat::Json => {
            serde_json::from_str(content).context("failed to parse JSON manifest")?
        }
    };
    Ok(manifest)
}

/// Read and parse a manifest file, picking the format from its extension.
///
/// # Errors
///
/// I/O and syntax errors, with the path in the error context.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Manifest> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    parse_manifest_str(&content, ManifestFormat::from_path(path))
        .with_context(|| format!("invalid manifest {}", path.display()))
}

/// [`load_manifest`] followed by [`Manifest::build_registry`].
///
/// # Errors
///
/// Anything either step reports.
pub fn load_registry(path: impl AsRef<Path>) -> Result<CandidateRegistry> {
    let path = path.as_ref();
    let manifest = load_manifest(path)?;
    let registry = manifest
        .build_registry()
        .with_context(|| format!("failed to compile manifest {}", path.display()))?;
    info!(
        manifest = %path.display(),
        routes = registry.route_count(),
        candidates = registry.len(),
        "Route manifest loaded"
    );
    Ok(registry)
}
