use super::app_config::LogLevel;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "image-loader",
    version,
    about = "Fetch, cache and decode remote images",
    long_about = None
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Load one or more images and print a summary.
    Load {
        /// Image URLs.
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },
    /// Remove every cached image from memory and disk.
    Clear,
    /// Report whether an image is cached.
    Contains {
        /// Image URL.
        #[arg(value_name = "URL")]
        url: String,
    },
}

/// Flags that override values from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct ConfigOverrides {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Disk cache directory.
    #[arg(long, value_name = "PATH", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Disk cache budget in bytes.
    #[arg(long, value_name = "BYTES", global = true)]
    pub disk_cache_max_bytes: Option<u64>,

    /// Maximum concurrent downloads.
    #[arg(long, value_name = "N", global = true)]
    pub max_concurrent_downloads: Option<usize>,

    /// Use the in-memory cache.
    #[arg(long, global = true)]
    pub memory_cache: Option<bool>,

    /// Use the disk cache.
    #[arg(long, global = true)]
    pub disk_cache: Option<bool>,

    /// Generate mip maps.
    #[arg(long, global = true)]
    pub mip_maps: Option<bool>,

    /// Decode without the intermediate image copy.
    #[arg(long, global = true)]
    pub memory_optimized: Option<bool>,

    /// Per-attempt network timeout in seconds (0 disables).
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout_seconds: Option<u64>,

    /// Retries after a failed network attempt.
    #[arg(long, value_name = "N", global = true)]
    pub max_retries: Option<u32>,

    /// Memory cache budget in bytes.
    #[arg(long, value_name = "BYTES", global = true)]
    pub memory_cache_capacity_bytes: Option<u64>,
}
