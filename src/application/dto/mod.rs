//! Data transfer objects for the application layer.

mod load_report;

pub use load_report::{CacheStatus, ImageSummary, LoadEntry, LoadReport, LoadSummary};
