use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::dispatcher::{no_match_status, NoMatch, Resolution};
use crate::hot_reload::watch_manifest;
use crate::manifest::{load_manifest, load_registry, print_issues};
use crate::registry::{parse_method, shared};

/// Command-line interface for route manifests
#[derive(Parser, Debug)]
#[command(name = "conneg")]
#[command(about = "Content-negotiation dispatch tooling", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a manifest and report every issue
    Validate {
        /// Path to the route manifest (YAML or JSON)
        #[arg(short, long, env = "CONNEG_MANIFEST")]
        manifest: PathBuf,
    },
    /// Print the compiled registry
    Inspect {
        /// Path to the route manifest (YAML or JSON)
        #[arg(short, long, env = "CONNEG_MANIFEST")]
        manifest: PathBuf,
    },
    /// Resolve a single request against a manifest
    Resolve {
        /// Path to the route manifest (YAML or JSON)
        #[arg(short, long, env = "CONNEG_MANIFEST")]
        manifest: PathBuf,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Full route template, including the manifest's base path
        #[arg(short, long)]
        route: String,

        /// Request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
    /// Load a manifest and hot-reload it on change
    Watch {
        /// Path to the route manifest (YAML or JSON)
        #[arg(short, long, env = "CONNEG_MANIFEST")]
        manifest: PathBuf,
    },
}

/// Parse a curl-style `Name: value` header argument.
///
/// # Errors
///
/// Missing `:`, an invalid header name, or a value that is not valid in HTTP.
pub fn parse_header_arg(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("header `{raw}` must look like `Name: value`");
    };
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .with_context(|| format!("invalid header name in `{raw}`"))?;
    let value = HeaderValue::from_str(value.trim())
        .with_context(|| format!("invalid header value in `{raw}`"))?;
    Ok((name, value))
}

/// One-line, human-readable outcome of a resolution.
#[must_use]
pub fn describe_resolution(resolution: &Resolution) -> String {
    match resolution {
        Resolution::Selected(selection) => format!(
            "selected {} ({:?}, contenders={}, specificity={}.{})",
            selection.handler,
            selection.kind,
            selection.contenders,
            selection.specificity.concreteness,
            selection.specificity.parameters
        ),
        Resolution::NoMatch(no_match) => {
            let status = no_match_status(no_match);
            let detail = match no_match {
                NoMatch::UnknownRoute => "unknown route".to_string(),
                NoMatch::MethodNotAllowed { allowed } => {
                    let allowed: Vec<&str> = allowed.iter().map(|m| m.as_str()).collect();
                    format!("method not allowed, allow: {}", allowed.join(", "))
                }
                NoMatch::Unsatisfied { headers } => {
                    let headers: Vec<&str> = headers.iter().map(HeaderName::as_str).collect();
                    format!("unsatisfied: {}", headers.join(", "))
                }
            };
            format!("no match -> {status} ({detail})")
        }
    }
}

fn validate(manifest: &Path) -> Result<()> {
    let parsed = load_manifest(manifest)?;
    let issues = parsed.validate();
    if !issues.is_empty() {
        print_issues(&issues);
        bail!(
            "{} issue(s) found in {}",
            issues.len(),
            manifest.display()
        );
    }
    println!(
        "✅ {} is valid ({} route declarations)",
        manifest.display(),
        parsed.routes.len()
    );
    Ok(())
}

fn resolve(manifest: &Path, method: &str, route: &str, raw_headers: &[String]) -> Result<()> {
    let registry = load_registry(manifest)?;
    let method = parse_method(method)?;
    let mut headers = HeaderMap::new();
    for raw in raw_headers {
        let (name, value) = parse_header_arg(raw)?;
        headers.append(name, value);
    }
    let resolution = registry.resolve(route, &method, &headers);
    println!("{method} {route} -> {}", describe_resolution(&resolution));
    Ok(())
}

fn watch(manifest: &Path) -> Result<()> {
    let registry = load_registry(manifest)?;
    registry.log_summary();
    let shared_registry = shared(registry);
    let _watcher = watch_manifest(manifest, shared_registry, |registry| {
        registry.log_summary();
    })
    .with_context(|| format!("failed to watch {}", manifest.display()))?;

    info!(manifest = %manifest.display(), "Watching manifest, press Ctrl-C to stop");
    loop {
        std::thread::sleep(Duration::from_secs(3600));
    }
}

/// Run a parsed command line.
///
/// # Errors
///
/// Whatever the selected command reports; `validate` fails when it finds issues.
pub fn run_cli(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Validate { manifest } => validate(manifest),
        Commands::Inspect { manifest } => {
            let registry = load_registry(manifest)?;
            registry.dump_routes();
            Ok(())
        }
        Commands::Resolve {
            manifest,
            method,
            route,
            headers,
        } => resolve(manifest, method, route, headers),
        Commands::Watch { manifest } => watch(manifest),
    }
}
