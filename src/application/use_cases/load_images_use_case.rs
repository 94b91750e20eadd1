//! Batch image loading use case.

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::application::dto::{ImageSummary, LoadEntry, LoadReport};
use crate::domain::entities::LoadConfig;
use crate::infrastructure::image::ImageLoader;

/// Loads a batch of URLs concurrently and reports each outcome.
#[derive(Debug, Clone)]
pub struct LoadImagesUseCase {
    loader: ImageLoader,
}

impl LoadImagesUseCase {
    /// Creates new load use case.
    #[must_use]
    pub const fn new(loader: ImageLoader) -> Self {
        Self { loader }
    }

    /// Loads every URL. Failures are reported per entry, never aborting the batch.
    pub async fn execute(&self, urls: &[String], config: &LoadConfig) -> LoadReport {
        debug!(count = urls.len(), "Loading image batch");

        let loads = urls.iter().map(|url| async move {
            let outcome = self.loader.load(url, config).await;
            if let Err(e) = &outcome {
                warn!(url = %url, error = %e, "Image load failed");
            }
            LoadEntry {
                url: url.clone(),
                outcome: outcome.map(|loaded| ImageSummary::from(&loaded)),
            }
        });

        let report = LoadReport {
            entries: join_all(loads).await,
        };

        let summary = report.summary();
        info!(
            loaded = summary.loaded,
            failed = summary.failed,
            "Image batch finished"
        );
        report
    }
}
