//! Load report DTOs.

use crate::domain::entities::{ImageSource, LoadedImage, StorageHint};
use crate::domain::errors::LoadError;
use crate::domain::size::format_size_auto;

/// Summary of one decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    /// Base level width.
    pub width: u32,
    /// Base level height.
    pub height: u32,
    /// Levels including the base level.
    pub mip_count: usize,
    /// Decoded size of all levels.
    pub byte_size: u64,
    /// Tier that served the image.
    pub source: ImageSource,
    /// Storage hint for texture creation.
    pub storage_hint: StorageHint,
}

impl From<&LoadedImage> for ImageSummary {
    fn from(loaded: &LoadedImage) -> Self {
        Self {
            width: loaded.artifact.width(),
            height: loaded.artifact.height(),
            mip_count: loaded.artifact.mip_count(),
            byte_size: loaded.artifact.byte_size(),
            source: loaded.source,
            storage_hint: loaded.artifact.storage_hint(),
        }
    }
}

impl std::fmt::Display for ImageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}, {} level(s), {} from {}",
            self.width,
            self.height,
            self.mip_count,
            format_size_auto(self.byte_size),
            self.source
        )?;
        if self.storage_hint == StorageHint::Uncompressed {
            write!(f, " (uncompressed)")?;
        }
        Ok(())
    }
}

/// Outcome of loading one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadEntry {
    /// Requested URL.
    pub url: String,
    /// Summary or failure.
    pub outcome: Result<ImageSummary, LoadError>,
}

impl std::fmt::Display for LoadEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            Ok(summary) => write!(f, "ok     {}: {summary}", self.url),
            Err(e) => write!(f, "failed {}: {e}", self.url),
        }
    }
}

/// Aggregate counts over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Successful loads.
    pub loaded: usize,
    /// Failed loads.
    pub failed: usize,
    /// Served from memory.
    pub from_memory: usize,
    /// Served from disk.
    pub from_disk: usize,
    /// Downloaded.
    pub from_network: usize,
    /// Decoded bytes across successful loads.
    pub total_bytes: u64,
}

impl std::fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} loaded, {} failed (memory {}, disk {}, network {}), {} decoded",
            self.loaded,
            self.failed,
            self.from_memory,
            self.from_disk,
            self.from_network,
            format_size_auto(self.total_bytes)
        )
    }
}

/// Per-URL results of a batch load, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// One entry per requested URL.
    pub entries: Vec<LoadEntry>,
}

impl LoadReport {
    /// Computes aggregate counts.
    #[must_use]
    pub fn summary(&self) -> LoadSummary {
        self.entries
            .iter()
            .fold(LoadSummary::default(), |mut acc, entry| {
                match &entry.outcome {
                    Ok(image) => {
                        acc.loaded += 1;
                        acc.total_bytes += image.byte_size;
                        match image.source {
                            ImageSource::MemoryCache => acc.from_memory += 1,
                            ImageSource::DiskCache => acc.from_disk += 1,
                            ImageSource::Network => acc.from_network += 1,
                        }
                    }
                    Err(_) => acc.failed += 1,
                }
                acc
            })
    }

    /// Returns true if every load succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.entries.iter().all(|entry| entry.outcome.is_ok())
    }
}

/// Cache presence of one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    /// Queried URL.
    pub url: String,
    /// Decoded image held in memory.
    pub in_memory: bool,
    /// Raw bytes held on disk.
    pub on_disk: bool,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        write!(
            f,
            "{}: memory {}, disk {}",
            self.url,
            yes_no(self.in_memory),
            yes_no(self.on_disk)
        )
    }
}
