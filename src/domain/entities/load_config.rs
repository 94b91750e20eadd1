//! Per-request load options.

use serde::{Deserialize, Serialize};

/// Default memory cache budget (128 MiB).
pub const DEFAULT_MEMORY_CACHE_CAPACITY: u64 = 128 * 1024 * 1024;

/// Options for a single load request.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Serve from and populate the in-memory cache.
    #[serde(default = "default_true")]
    pub use_memory_cache: bool,

    /// Serve from and populate the on-disk byte cache.
    #[serde(default = "default_true")]
    pub use_disk_cache: bool,

    /// Build the full mip chain after decoding.
    #[serde(default = "default_true")]
    pub generate_mip_maps: bool,

    /// Decode straight into the output buffer, skipping the intermediate copy.
    #[serde(default)]
    pub memory_optimized: bool,

    /// Timeout for each network attempt. Zero disables the timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retries after the first failed network attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Soft byte budget of the memory cache.
    #[serde(default = "default_memory_cache_capacity")]
    pub memory_cache_capacity_bytes: u64,
}

impl LoadConfig {
    /// Sets memory cache usage.
    #[must_use]
    pub const fn with_memory_cache(mut self, enabled: bool) -> Self {
        self.use_memory_cache = enabled;
        self
    }

    /// Sets disk cache usage.
    #[must_use]
    pub const fn with_disk_cache(mut self, enabled: bool) -> Self {
        self.use_disk_cache = enabled;
        self
    }

    /// Sets mip chain generation.
    #[must_use]
    pub const fn with_mip_maps(mut self, enabled: bool) -> Self {
        self.generate_mip_maps = enabled;
        self
    }

    /// Sets the memory-optimized decode path.
    #[must_use]
    pub const fn with_memory_optimized(mut self, enabled: bool) -> Self {
        self.memory_optimized = enabled;
        self
    }

    /// Sets the per-attempt timeout in seconds.
    #[must_use]
    pub const fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the memory cache budget in bytes.
    #[must_use]
    pub const fn with_memory_capacity(mut self, bytes: u64) -> Self {
        self.memory_cache_capacity_bytes = bytes;
        self
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            use_memory_cache: true,
            use_disk_cache: true,
            generate_mip_maps: true,
            memory_optimized: false,
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            memory_cache_capacity_bytes: DEFAULT_MEMORY_CACHE_CAPACITY,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_memory_cache_capacity() -> u64 {
    DEFAULT_MEMORY_CACHE_CAPACITY
}
