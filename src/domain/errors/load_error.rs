//! Load pipeline error types.

use thiserror::Error;

/// Result type for load operations.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Errors surfaced by the image loading pipeline.
///
/// Cloneable so a single failure can be handed to every waiter of a shared load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum LoadError {
    /// Network transfer failed after exhausting retries.
    #[error("fetch failed after {attempts} attempt(s): {cause}")]
    Fetch { cause: String, attempts: u32 },

    /// Bytes could not be decoded into an image.
    #[error("decode failed: {cause}")]
    Decode { cause: String },

    /// Disk cache read or write failed.
    #[error("cache storage error: {cause}")]
    StoreIo { cause: String },

    /// The requested URL cannot be used as a cache key.
    #[error("invalid cache key: {reason}")]
    InvalidKey { reason: String },

    /// The shared load ended without producing a result.
    #[error("load interrupted before completion")]
    Interrupted,
}

impl LoadError {
    /// Creates fetch error.
    #[must_use]
    pub fn fetch(cause: impl Into<String>, attempts: u32) -> Self {
        Self::Fetch {
            cause: cause.into(),
            attempts,
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(cause: impl Into<String>) -> Self {
        Self::Decode {
            cause: cause.into(),
        }
    }

    /// Creates storage error.
    #[must_use]
    pub fn store_io(cause: impl Into<String>) -> Self {
        Self::StoreIo {
            cause: cause.into(),
        }
    }

    /// Creates invalid key error.
    #[must_use]
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Returns whether the failure came from the network.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    /// Returns whether the failure came from decoding.
    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns whether a later retry of the same load may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::StoreIo { .. } | Self::Interrupted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message() {
        let err = LoadError::fetch("HTTP 503", 3);
        assert_eq!(err.to_string(), "fetch failed after 3 attempt(s): HTTP 503");
        assert!(err.is_network_error());
        assert!(!err.is_decode_error());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_decode_error_is_not_recoverable() {
        let err = LoadError::decode("corrupt header");
        assert!(err.is_decode_error());
        assert!(!err.is_recoverable());
    }
}
