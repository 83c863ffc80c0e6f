//! Settings file support.
//!
//! `$HOME/.reportr/settings.json` may carry an `env` map that acts as a
//! fallback for environment variables:
//!
//! ```json
//! { "env": { "AZURE_OPENAI_KEY": "...", "AZURE_OPENAI_ENDPOINT": "https://..." } }
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::warn;

/// Settings loaded from `$HOME/.reportr/settings.json`.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable fallbacks.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path; a missing file yields empty settings.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home_dir.join(".reportr").join("settings.json"))
    }

    /// Returns an environment variable, falling back to these settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .filter(|value| !value.is_empty())
            .or_else(|| self.env.get(key).cloned())
    }
}

/// Returns an environment variable with fallback to the settings file.
///
/// An unreadable settings file is logged and treated as empty.
pub fn get_env_var(key: &str) -> Result<String> {
    let settings = Settings::load().unwrap_or_else(|err| {
        warn!("Ignoring settings file: {err:#}");
        Settings::default()
    });
    settings
        .get_env_var(key)
        .ok_or_else(|| anyhow!("Environment variable not found: {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_settings(dir: &TempDir) -> PathBuf {
        let settings_path = dir.path().join("settings.json");
        fs::write(
            &settings_path,
            r#"{
                "env": {
                    "REPORTR_TEST_SETTING": "from_settings",
                    "AZURE_OPENAI_DEPLOYMENT": "custom"
                }
            }"#,
        )
        .unwrap();
        settings_path
    }

    #[test]
    fn settings_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(write_settings(&temp_dir)).unwrap();
        assert_eq!(settings.env["REPORTR_TEST_SETTING"], "from_settings");
        assert_eq!(settings.env["AZURE_OPENAI_DEPLOYMENT"], "custom");
    }

    #[test]
    fn missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(temp_dir.path().join("absent.json")).unwrap();
        assert!(settings.env.is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load_from_path(&path).is_err());
    }

    #[test]
    fn environment_takes_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(write_settings(&temp_dir)).unwrap();

        env::set_var("REPORTR_TEST_PRECEDENCE", "env_value");
        assert_eq!(
            settings.get_env_var("REPORTR_TEST_PRECEDENCE").as_deref(),
            Some("env_value")
        );
        env::remove_var("REPORTR_TEST_PRECEDENCE");

        assert_eq!(
            settings.get_env_var("REPORTR_TEST_SETTING").as_deref(),
            Some("from_settings")
        );
        assert_eq!(settings.get_env_var("REPORTR_TEST_UNSET"), None);
    }
}
