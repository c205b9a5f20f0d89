//! Locates, loads and saves `settings.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::settings::ImportSettings;
use crate::error::ConfigError;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "TESTLINK_CONFIG_DIR";

/// File name of the settings file inside the configuration directory
pub const SETTINGS_FILE_NAME: &str = "settings.toml";

const APP_DIR: &str = "testlink-bridge";

/// Reads and writes [`ImportSettings`] in one configuration directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Uses the given directory
    #[must_use]
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Resolves the directory from an explicit path, then
    /// `TESTLINK_CONFIG_DIR`, then the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if none of them is available.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(dir) = explicit {
            return Ok(Self::with_config_dir(expand(dir)));
        }
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_config_dir(expand(Path::new(&dir))));
        }
        dirs::config_dir()
            .map(|dir| Self::with_config_dir(dir.join(APP_DIR)))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// The configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path of the settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE_NAME)
    }

    /// Loads settings; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_settings(&self) -> Result<ImportSettings, ConfigError> {
        let path = self.settings_path();
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(ImportSettings::default());
        }
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Writes settings, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_settings(&self, settings: &ImportSettings) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir)?;
        let content =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(self.settings_path(), content)?;
        debug!(path = %self.settings_path().display(), "Settings saved");
        Ok(())
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
