//! Configuration persistence.
//!
//! One configuration record per user, at a fixed well-known path, stored as
//! human-editable sorted-key JSON. Absence or corruption of the file is not
//! an error: `load` silently yields defaults, and `save` is fire-and-forget
//! from the engine's perspective.

use std::{
    fs,
    path::{Path, PathBuf},
};

#[cfg(test)]
use mockall::automock;

use super::{Configuration, DEFAULT_POLL_INTERVAL};

/// A store for loading and persisting the engine configuration.
///
/// Implementations must never fail outward: `load` falls back to usable
/// defaults and `save` swallows write errors.
#[cfg_attr(test, automock)]
pub trait ConfigStore: Send + Sync {
    /// Loads the stored configuration, or defaults if none is usable.
    fn load(&self) -> Configuration;

    /// Persists the configuration, best-effort.
    fn save(&self, config: &Configuration);
}

/// File-backed [`ConfigStore`] serializing to pretty sorted-key JSON.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    /// Creates a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the fixed per-user location,
    /// `<config_dir>/clipwatch/config.json`. Returns `None` when the
    /// platform exposes no per-user configuration directory.
    pub fn at_default_path() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("clipwatch").join("config.json")))
    }

    /// The file path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonConfigStore {
    fn load(&self) -> Configuration {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::info!(
                    path = %self.path.display(),
                    error = %e,
                    "No stored configuration, using defaults."
                );
                return Configuration::default();
            }
        };

        let mut config: Configuration = match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Stored configuration is unparsable, using defaults."
                );
                return Configuration::default();
            }
        };

        // A zero poll interval would spin the poll loop.
        if config.poll_interval.is_zero() {
            tracing::warn!("Stored poll interval is zero, falling back to default.");
            config.poll_interval = DEFAULT_POLL_INTERVAL;
        }

        config
    }

    fn save(&self, config: &Configuration) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(
                    path = %parent.display(),
                    error = %e,
                    "Failed to create configuration directory."
                );
                return;
            }
        }

        let json = match serde_json::to_string_pretty(config) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize configuration.");
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, json) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist configuration."
            );
        } else {
            tracing::debug!(path = %self.path.display(), "Configuration persisted.");
        }
    }
}
