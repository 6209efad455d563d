//! Settings file loading
//!
//! Settings live in a single TOML file, by default
//! `<config dir>/enchantry/settings.toml`. A missing file is not an error:
//! every field has a default.

use std::fs;
use std::path::{Path, PathBuf};

use enchantry_types::EngineSettings;

use crate::error::ConfigError;

/// Load settings from `path`, falling back to defaults if it does not exist.
pub fn load_settings(path: &Path) -> Result<EngineSettings, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No settings file, using defaults");
        return Ok(EngineSettings::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let settings = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), "Loaded settings");
    Ok(settings)
}

/// Write `settings` to `path`, creating parent directories as needed.
pub fn save_settings(path: &Path, settings: &EngineSettings) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(settings).map_err(|e| ConfigError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(path, contents).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Default settings file location.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("enchantry").join("settings.toml"))
}
