//! Application settings.
//!
//! Defaults for the command line, read from a JSON file in the XDG config
//! directory (`~/.config/tcpsweep/settings.json` on Linux) or from an
//! explicit path. Command-line flags always win over these values.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Location of the default settings file, if a home directory is known.
pub fn default_settings_file() -> ConfigResult<PathBuf> {
    let project =
        ProjectDirs::from("com", "tcpsweep", "tcpsweep").ok_or(ConfigError::DirectoryNotFound)?;
    Ok(project.config_dir().join("settings.json"))
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Default number of simultaneous probes.
    pub default_concurrency: usize,
    /// Default connection timeout in milliseconds.
    pub default_timeout_ms: u64,
    /// Report closed ports as they are found.
    pub show_closed: bool,
    pub verbose: bool,
    /// One of "plain", "json", "csv".
    pub default_output_format: String,
    /// Dispatch ports in shuffled order.
    pub random_order: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_concurrency: 100,
            default_timeout_ms: 1000,
            show_closed: false,
            verbose: false,
            default_output_format: "plain".to_string(),
            random_order: false,
        }
    }
}

impl AppSettings {
    /// Load settings.
    ///
    /// With an explicit path the file must exist. Without one, the default
    /// file is used when present and built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let file = match default_settings_file() {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!(error = %e, "no config directory, using defaults");
                return Ok(Self::default());
            }
        };
        if !file.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}
