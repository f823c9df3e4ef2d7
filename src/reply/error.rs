//! Reply provider error types

use thiserror::Error;

/// Provider failure. The message becomes the session's error text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ReplyError {
    pub kind: ReplyErrorKind,
    pub message: String,
}

impl ReplyError {
    #[allow(dead_code)] // Reached through the kind constructors
    pub fn new(kind: ReplyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ReplyErrorKind::Network, message)
    }

    #[allow(dead_code)] // Used in tests
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ReplyErrorKind::Timeout, message)
    }

    #[allow(dead_code)] // Used by test providers
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ReplyErrorKind::Unavailable, message)
    }

    #[allow(dead_code)] // Used in tests
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ReplyErrorKind::InvalidRequest, message)
    }

    #[allow(dead_code)] // Used by test providers
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ReplyErrorKind::Unknown, message)
    }
}

/// Error classification, reported in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyErrorKind {
    /// Transport failure
    Network,
    /// Deadline imposed by the caller or transport expired
    Timeout,
    /// Provider is overloaded or not configured
    Unavailable,
    /// Provider refused the request
    InvalidRequest,
    Unknown,
}

impl ReplyErrorKind {
    /// Whether an explicit retry has a reasonable chance of succeeding
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Unavailable)
    }
}
