//! User settings, read from `settings.toml` in the bstock config folder.
//!
//! The file is optional. Every setting has a default and the command line can switch on
//! `overwrite` and `debug_model` for a single run.
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// The folder holding bstock's configuration files.
///
/// This is `bstock` inside the platform's config folder, or the current folder if the platform
/// has none.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("bstock"))
        .unwrap_or_default()
}

/// Where [`Settings::load`] looks for the settings file
pub fn settings_file_path() -> PathBuf {
    config_dir().join(SETTINGS_FILE_NAME)
}

/// Program settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Log level, unless overridden by `BSTOCK_LOG_LEVEL`
    pub log_level: String,
    /// Replace a non-empty output folder instead of refusing to run
    pub overwrite: bool,
    /// Also write the retrofit-eligible floor space for every year
    pub debug_model: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            overwrite: false,
            debug_model: false,
        }
    }
}

impl Settings {
    /// Read the user's settings file, or use defaults if there isn't one
    pub fn load() -> Result<Self> {
        Self::from_file(&settings_file_path())
    }

    fn from_file(file_path: &Path) -> Result<Self> {
        if file_path.is_file() {
            read_toml(file_path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_settings_missing_file() {
        let dir = tempdir().unwrap();
        assert_eq!(
            Settings::from_file(&dir.path().join(SETTINGS_FILE_NAME)).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_partial_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&file_path, "debug_model = true\n").unwrap();

        assert_eq!(
            Settings::from_file(&file_path).unwrap(),
            Settings {
                debug_model: true,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn test_settings_unknown_key() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&file_path, "debug_modle = true\n").unwrap();

        assert!(Settings::from_file(&file_path).is_err());
    }

    #[test]
    fn test_settings_file_path() {
        let path = settings_file_path();
        assert_eq!(path.file_name().unwrap(), SETTINGS_FILE_NAME);
        assert_eq!(path.parent().unwrap(), config_dir());
    }
}
