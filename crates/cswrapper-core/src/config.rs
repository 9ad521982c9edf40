//! Adapter configuration.
//!
//! Every setting has a built-in default and can be overridden through an
//! environment variable. The adapter reads the environment once per process;
//! tests construct [`WrapperConfig`] values directly.

use std::env::consts::DLL_SUFFIX;
use std::path::{Path, PathBuf};

use crate::error::{Result, WrapperError};

/// Environment variable names.
pub mod env_vars {
    /// Filename suffix of the adapter library, replaced to find the companion.
    pub const ADAPTER_SUFFIX: &str = "CSWRAPPER_ADAPTER_SUFFIX";
    /// Filename suffix of the companion library.
    pub const COMPANION_SUFFIX: &str = "CSWRAPPER_COMPANION_SUFFIX";
    /// Explicit companion path; skips suffix derivation entirely.
    pub const COMPANION_PATH: &str = "CSWRAPPER_COMPANION_PATH";
    /// `tracing` filter directives. Logging stays off when unset.
    pub const LOG: &str = "CSWRAPPER_LOG";
    /// Emit JSON log lines instead of the compact format.
    pub const LOG_JSON: &str = "CSWRAPPER_LOG_JSON";
}

/// Marker between the model identifier and the library extension of the adapter.
pub const DEFAULT_ADAPTER_MARKER: &str = "_cs";

/// Default adapter suffix, e.g. `_cs.so` for `model_cs.so`.
pub fn default_adapter_suffix() -> String {
    format!("{}{}", DEFAULT_ADAPTER_MARKER, DLL_SUFFIX)
}

/// Default companion suffix: the platform's native library extension.
pub fn default_companion_suffix() -> String {
    DLL_SUFFIX.to_string()
}

/// How the companion filename is derived from the adapter filename.
///
/// Both libraries live in the same directory. The adapter file name must end
/// with `adapter_suffix` and carry at least one character before it; that
/// suffix is swapped for `companion_suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixPolicy {
    pub adapter_suffix: String,
    pub companion_suffix: String,
}

impl Default for SuffixPolicy {
    fn default() -> Self {
        Self {
            adapter_suffix: default_adapter_suffix(),
            companion_suffix: default_companion_suffix(),
        }
    }
}

impl SuffixPolicy {
    pub fn new(adapter_suffix: impl Into<String>, companion_suffix: impl Into<String>) -> Self {
        Self {
            adapter_suffix: adapter_suffix.into(),
            companion_suffix: companion_suffix.into(),
        }
    }

    /// Derive the companion library path from the adapter's own path.
    pub fn companion_path(&self, adapter_path: &Path) -> Result<PathBuf> {
        let invalid = || WrapperError::InvalidAdapterPath {
            path: adapter_path.to_path_buf(),
            suffix: self.adapter_suffix.clone(),
        };

        if self.adapter_suffix.is_empty() {
            return Err(invalid());
        }

        let file_name = adapter_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(invalid)?;

        let stem = file_name
            .strip_suffix(self.adapter_suffix.as_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(invalid)?;

        Ok(adapter_path.with_file_name(format!("{}{}", stem, self.companion_suffix)))
    }
}

/// Process-wide adapter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperConfig {
    pub suffix: SuffixPolicy,
    pub companion_path: Option<PathBuf>,
}

impl WrapperConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            suffix: SuffixPolicy {
                adapter_suffix: non_empty(env_vars::ADAPTER_SUFFIX)
                    .unwrap_or_else(default_adapter_suffix),
                companion_suffix: non_empty(env_vars::COMPANION_SUFFIX)
                    .unwrap_or_else(default_companion_suffix),
            },
            companion_path: non_empty(env_vars::COMPANION_PATH).map(PathBuf::from),
        }
    }

    /// Resolve where the companion should be loaded from.
    pub fn companion_path(&self, adapter_path: &Path) -> Result<PathBuf> {
        match &self.companion_path {
            Some(path) => Ok(path.clone()),
            None => self.suffix.companion_path(adapter_path),
        }
    }
}
