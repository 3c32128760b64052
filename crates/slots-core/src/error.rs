//! Error types for the slot machine core

use thiserror::Error;

/// Core error type
///
/// Supply-side failures (rate limits, transport problems) never show up
/// here directly; a machine only ever sees them as [`SlotError::Unavailable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// Malformed construction input (bad range, duplicate numbers, bad coordinates)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Illegal transition or missing prerequisite
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Unknown machine
    #[error("Not found: {0}")]
    NotFound(String),

    /// The number buffer cannot satisfy a request right now
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Request exceeds the per-call cap
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SlotError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// True for failures a caller may retry later without changing its input
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<serde_json::Error> for SlotError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias
pub type SlotResult<T> = Result<T, SlotError>;
