//! # Hot Reload Module
//!
//! Live reloading of the route manifest without restarting the service.
//!
//! ## Overview
//!
//! [`watch_manifest`] watches the manifest file and, on every modification:
//! 1. **Parse** - the manifest is loaded and compiled into a fresh [`CandidateRegistry`]
//! 2. **Swap** - the new registry is stored into the [`SharedRegistry`]
//! 3. **Hooks** - the caller's callback sees the new registry (e.g. to check
//!    [`missing_handlers`](crate::dispatcher::Dispatcher::missing_handlers))
//!
//! ## Usage
//!
//! ```rust,no_run
//! use brrtconneg::dispatcher::Dispatcher;
//! use brrtconneg::hot_reload::watch_manifest;
//! use brrtconneg::manifest::load_registry;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dispatcher = Dispatcher::from_registry(load_registry("routes.yaml")?);
//! let _watcher = watch_manifest("routes.yaml", dispatcher.shared_registry(), |registry| {
//!     println!("Reloaded {} candidates", registry.len());
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! The watcher stops when the returned handle is dropped.
//!
//! ## Error Handling
//!
//! If the new manifest fails to parse or compile the error is logged, the previous
//! registry stays active and requests keep being served.
//!
//! ## Concurrency
//!
//! Requests in flight keep the snapshot they loaded; the swap is a single atomic
//! pointer store, so no request ever observes a half-built registry.

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::manifest::load_registry;
use crate::registry::{shared, CandidateRegistry, SharedRegistry};
use crate::runtime_config::RuntimeConfig;

/// [`load_registry`], rejecting a manifest that compiles to no candidates at all.
fn load_non_empty(path: &Path) -> anyhow::Result<CandidateRegistry> {
    let registry = load_registry(path)?;
    if registry.is_empty() {
        anyhow::bail!("manifest {} declares no routes", path.display());
    }
    Ok(registry)
}

/// Rebuild the registry from `path` and store it into `shared`.
///
/// A manifest that compiles to no candidates at all is rejected too: editors often
/// truncate a file before writing it back.
///
/// # Errors
///
/// Load or compile failures, or an empty result; `shared` is left untouched then.
pub fn reload_registry(
    path: impl AsRef<Path>,
    shared: &SharedRegistry,
) -> anyhow::Result<Arc<CandidateRegistry>> {
    let path = path.as_ref();
    let registry = Arc::new(load_non_empty(path)?);
    shared.store(Arc::clone(&registry));
    Ok(registry)
}

/// Watch a manifest file and swap a rebuilt registry into `shared` when it changes.
///
/// `on_reload` runs after each successful swap.
///
/// # Errors
///
/// Fails if the filesystem watcher cannot be created or the path cannot be watched.
pub fn watch_manifest<P, F>(
    manifest_path: P,
    shared: SharedRegistry,
    mut on_reload: F,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
    F: FnMut(&CandidateRegistry) + Send + 'static,
{
    let path: PathBuf = manifest_path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                match reload_registry(&watch_path, &shared) {
                    Ok(registry) => {
                        info!(
                            manifest = %watch_path.display(),
                            routes = registry.route_count(),
                            candidates = registry.len(),
                            "hot-reload: registry swapped"
                        );
                        on_reload(&registry);
                    }
                    Err(err) => warn!(
                        manifest = %watch_path.display(),
                        error = %format!("{err:#}"),
                        "hot-reload: manifest rejected, keeping previous registry"
                    ),
                }
            }
            Err(e) => error!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    info!(manifest = %path.display(), "hot-reload: watching manifest");
    Ok(watcher)
}

/// Load the configured manifest and, when `hot_reload` is on, start watching it.
///
/// # Errors
///
/// No manifest configured, an invalid or empty manifest, or a watcher that cannot start.
pub fn load_from_config(
    config: &RuntimeConfig,
) -> anyhow::Result<(SharedRegistry, Option<RecommendedWatcher>)> {
    let Some(path) = config.manifest_path.as_deref() else {
        anyhow::bail!("no route manifest configured (set CONNEG_MANIFEST)");
    };
    let registry = load_non_empty(path)?;
    registry.log_summary();
    let shared_registry = shared(registry);

    if !config.hot_reload {
        return Ok((shared_registry, None));
    }
    let watcher = watch_manifest(path, Arc::clone(&shared_registry), |registry| {
        registry.log_summary();
    })?;
    Ok((shared_registry, Some(watcher)))
}
