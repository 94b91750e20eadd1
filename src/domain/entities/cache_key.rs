//! Cache key shared by every store.

use sha2::{Digest, Sha256};

use crate::domain::errors::LoadError;

/// Normalized URL identifying an image across memory and disk stores.
///
/// Normalization trims surrounding whitespace and preserves case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Parses a URL into a cache key.
    ///
    /// # Errors
    /// Returns [`LoadError::InvalidKey`] if the URL is empty after trimming.
    pub fn parse(url: &str) -> Result<Self, LoadError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(LoadError::invalid_key("URL is empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the normalized URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a filesystem-safe name for this key: the hex SHA-256 of the URL.
    #[must_use]
    pub fn file_stem(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for CacheKey {
    type Error = LoadError;

    fn try_from(url: &str) -> Result<Self, Self::Error> {
        Self::parse(url)
    }
}
