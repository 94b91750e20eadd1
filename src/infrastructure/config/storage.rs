use super::app_config::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, AppConfig};
use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine config directory")]
    ConfigDirNotFound,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// How the configuration file was obtained.
#[derive(Debug)]
pub enum ConfigLoad {
    /// The file was read and parsed.
    Parsed(AppConfig),
    /// The file was missing; defaults were written to it.
    Created(AppConfig),
    /// The file could not be parsed; defaults are used and the file is kept.
    Fallback(AppConfig, toml::de::Error),
}

impl ConfigLoad {
    /// Returns the configuration to use.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        match self {
            Self::Parsed(config) | Self::Created(config) | Self::Fallback(config, _) => config,
        }
    }
}

/// Reads and writes `config.toml`.
pub struct StorageManager {
    config_path: PathBuf,
}

impl StorageManager {
    /// Uses `config.toml` in the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration directory cannot be determined.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::ConfigDirNotFound)?;

        Ok(Self::at(config_dir.join(CONFIG_FILE_NAME)))
    }

    /// Uses the given configuration file.
    #[must_use]
    pub const fn at(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Returns the configuration file path.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Loads the application configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or a missing file
    /// cannot be created.
    pub fn load_config(&self) -> Result<ConfigLoad, ConfigError> {
        if !self.config_path.exists() {
            let config = AppConfig::default();
            self.save_config(&config)?;
            return Ok(ConfigLoad::Created(config));
        }

        let content = fs::read_to_string(&self.config_path)?;
        Ok(match toml::from_str::<AppConfig>(&content) {
            Ok(config) => ConfigLoad::Parsed(config),
            Err(e) => ConfigLoad::Fallback(AppConfig::default(), e),
        })
    }

    /// Writes the configuration atomically, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be written.
    pub fn save_config(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let parent = self
            .config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let content = toml::to_string_pretty(config)?;
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.persist(&self.config_path).map_err(|e| e.error)?;

        Ok(())
    }
}
