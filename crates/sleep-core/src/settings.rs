//! Persisted user settings and data-directory resolution.
//!
//! The data directory is resolved once at the program boundary with
//! [`resolve_data_dir`] and then passed around explicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Environment variable overriding the configured data directory.
pub const DATA_DIR_ENV_VAR: &str = "SLEEP_RECORDS_DATA_DIR";

/// Directory name under the home directory used when nothing is configured.
pub const DEFAULT_DATA_DIR_NAME: &str = ".sleep-records";

/// User settings.
///
/// Serialized to TOML and stored in the user's config directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root directory holding one subdirectory per dataset.
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default path.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from a specific path.
    ///
    /// A missing file yields the defaults; an unreadable one is logged and
    /// also yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid settings file");
                Self::default()
            }
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let write_error = |message: String| PipelineError::SettingsWrite {
            path: path.to_path_buf(),
            message,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| write_error(format!("failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| write_error(format!("failed to serialize settings: {e}")))?;
        std::fs::write(path, content).map_err(|e| write_error(e.to_string()))
    }

    /// Get the default config file path.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("org", "SleepRecords", "sleep-records")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from("settings.toml"))
    }
}

/// Resolves the data directory.
///
/// Resolution order:
/// 1. `override_dir`
/// 2. `SLEEP_RECORDS_DATA_DIR` environment variable
/// 3. `data_dir` from the settings file
/// 4. `~/.sleep-records`
pub fn resolve_data_dir(override_dir: Option<&Path>) -> PathBuf {
    let env_dir = std::env::var_os(DATA_DIR_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    let settings = if override_dir.is_none() && env_dir.is_none() {
        Settings::load()
    } else {
        Settings::default()
    };
    resolve_data_dir_with(override_dir, env_dir.as_deref(), &settings, home_dir().as_deref())
}

/// Resolution with every input explicit.
pub fn resolve_data_dir_with(
    override_dir: Option<&Path>,
    env_dir: Option<&Path>,
    settings: &Settings,
    home: Option<&Path>,
) -> PathBuf {
    let chosen = override_dir
        .or(env_dir)
        .or(settings.data_dir.as_deref())
        .map(Path::to_path_buf);
    match chosen {
        Some(dir) => expand_home(&dir, home),
        None => home
            .map(|home| home.join(DEFAULT_DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR_NAME)),
    }
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Expands a leading `~` component.
fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return path.to_path_buf();
    };
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
