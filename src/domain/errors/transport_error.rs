//! Network transport error types.

use thiserror::Error;

/// Whether a transport failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Timeouts, connection resets, server-side errors.
    Transient,
    /// Client errors and malformed requests.
    Permanent,
}

/// Failure of a single network attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// Retry classification.
    pub kind: TransportErrorKind,
    /// Human-readable cause.
    pub message: String,
}

impl TransportError {
    /// Creates transient error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Transient,
            message: message.into(),
        }
    }

    /// Creates permanent error.
    #[must_use]
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Permanent,
            message: message.into(),
        }
    }

    /// Classifies a non-success HTTP status.
    ///
    /// 408, 429 and 5xx are transient; everything else is permanent.
    #[must_use]
    pub fn from_status(status: u16, reason: Option<&str>) -> Self {
        let message = format!("HTTP {status}: {}", reason.unwrap_or("Unknown"));
        match status {
            408 | 429 | 500..=599 => Self::transient(message),
            _ => Self::permanent(message),
        }
    }

    /// Returns whether the attempt may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, TransportErrorKind::Transient)
    }
}
