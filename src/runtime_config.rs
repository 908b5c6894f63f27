//! # Runtime Configuration Module
//!
//! Environment-driven configuration for services embedding the dispatcher and for the
//! `conneg` binary. CLI flags take precedence over anything read here.
//!
//! ## Environment Variables
//!
//! ### `CONNEG_MANIFEST`
//!
//! Path of the route manifest (YAML or JSON) to load at startup. Unset means the
//! registry is composed in code.
//!
//! ### `CONNEG_HOT_RELOAD`
//!
//! `true`/`1`/`yes` to watch the manifest and swap in a rebuilt registry on change.
//! Default: `false`.
//!
//! ### Logging
//!
//! The `CONNEG_LOG_*` variables are read into [`LogConfig`]; see [`crate::logging`].
//!
//! ## Usage
//!
//! ```rust
//! use brrtconneg::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! if let Some(path) = &config.manifest_path {
//!     println!("manifest: {}", path.display());
//! }
//! ```

use std::path::PathBuf;

use crate::logging::LogConfig;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuntimeConfig {
    /// Manifest to load at startup
    pub manifest_path: Option<PathBuf>,
    /// Watch the manifest for changes
    pub hot_reload: bool,
    pub log: LogConfig,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RuntimeConfig::from_env`] over an arbitrary variable source.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let manifest_path = lookup("CONNEG_MANIFEST")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let hot_reload = lookup("CONNEG_HOT_RELOAD")
            .map(|val| parse_flag(&val))
            .unwrap_or(false);
        RuntimeConfig {
            manifest_path,
            hot_reload,
            log: LogConfig::from_lookup(&lookup),
        }
    }
}

fn parse_flag(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
