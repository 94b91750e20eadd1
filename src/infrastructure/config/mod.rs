//! Application configuration.

pub mod app_config;
pub mod args;
pub mod storage;

pub use app_config::{AppConfig, LogLevel};
pub use args::{CliArgs, Command, ConfigOverrides};
pub use storage::{ConfigError, ConfigLoad, StorageManager};
