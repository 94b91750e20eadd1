//! Image loader - remote image fetching with memory and disk caching.
//!
//! This crate loads images by URL through a three-tier cache, decodes them
//! into engine-independent RGBA8 artifacts with optional mip chains, and
//! shares a single in-flight load between concurrent callers of one URL.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing use cases and DTOs.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "image-loader";
