//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::args::ConfigOverrides;
use crate::domain::entities::LoadConfig;
use crate::infrastructure::image::{DEFAULT_MAX_CACHE_SIZE, ImageLoaderConfig, default_cache_dir};

pub(crate) const APP_NAME: &str = "image-loader";
pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from `config.toml` and CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path. Logs go to stderr when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Disk cache root. Defaults to the platform cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Disk cache budget in bytes.
    #[serde(default = "default_disk_cache_max_bytes")]
    pub disk_cache_max_bytes: u64,

    /// Maximum concurrent network fetches.
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Default per-load options.
    #[serde(default)]
    pub load: LoadConfig,
}

const fn default_disk_cache_max_bytes() -> u64 {
    DEFAULT_MAX_CACHE_SIZE
}

const fn default_max_concurrent_downloads() -> usize {
    4
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: ConfigOverrides) {
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(cache_dir) = args.cache_dir {
            self.cache_dir = Some(cache_dir);
        }
        if let Some(max_bytes) = args.disk_cache_max_bytes {
            self.disk_cache_max_bytes = max_bytes;
        }
        if let Some(max_downloads) = args.max_concurrent_downloads {
            self.max_concurrent_downloads = max_downloads;
        }
        if let Some(enabled) = args.memory_cache {
            self.load.use_memory_cache = enabled;
        }
        if let Some(enabled) = args.disk_cache {
            self.load.use_disk_cache = enabled;
        }
        if let Some(enabled) = args.mip_maps {
            self.load.generate_mip_maps = enabled;
        }
        if let Some(enabled) = args.memory_optimized {
            self.load.memory_optimized = enabled;
        }
        if let Some(seconds) = args.timeout_seconds {
            self.load.timeout_seconds = seconds;
        }
        if let Some(retries) = args.max_retries {
            self.load.max_retries = retries;
        }
        if let Some(bytes) = args.memory_cache_capacity_bytes {
            self.load.memory_cache_capacity_bytes = bytes;
        }
    }

    /// Returns effective disk cache directory.
    #[must_use]
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Returns the loader settings derived from this configuration.
    #[must_use]
    pub const fn loader_config(&self) -> ImageLoaderConfig {
        ImageLoaderConfig {
            max_concurrent_downloads: self.max_concurrent_downloads,
            memory_cache_capacity_bytes: self.load.memory_cache_capacity_bytes,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LogLevel::Info,
            cache_dir: None,
            disk_cache_max_bytes: default_disk_cache_max_bytes(),
            max_concurrent_downloads: default_max_concurrent_downloads(),
            load: LoadConfig::default(),
        }
    }
}
