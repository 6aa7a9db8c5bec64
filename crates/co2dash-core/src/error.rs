//! Error types for co2dash-core.
//!
//! # Failure classes
//!
//! | Class | Variant | Handling |
//! |-------|---------|----------|
//! | Transport | [`Error::Transport`] | Logged at the call site; a failed start leaves the controller idle, a failed live tick is skipped |
//! | Malformed response | [`Error::MalformedResponse`] | Treated like a transport failure |
//! | Empty result | *(not an error)* | A start with zero records enters [`SessionPhase::Empty`](crate::SessionPhase::Empty); an empty live tick is "no new data" |
//!
//! Nothing here is fatal: the worst case is a dashboard showing stale or
//! missing data. There is no retry, backoff, or circuit breaker; the next
//! live tick is independent of the previous one.

use thiserror::Error;

use co2dash_types::{DayKey, ParseError};

/// Errors produced by the dashboard core.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The store could not be reached or answered with a failure status.
    #[error("Request '{operation}' failed: {message}")]
    Transport {
        /// Store operation that failed.
        operation: &'static str,
        /// Human-readable cause.
        message: String,
    },

    /// The store answered with something that is not the expected JSON shape.
    #[error("Malformed response to '{operation}': {message}")]
    MalformedResponse {
        /// Store operation whose response was rejected.
        operation: &'static str,
        /// Decoder message.
        message: String,
    },

    /// The requested day is not part of the day catalog.
    #[error("Day {0} is not in the catalog")]
    UnknownDay(DayKey),

    /// Start was requested with nothing selected and an empty catalog.
    #[error("No day selected and no days available")]
    NoDaySelected,

    /// A newer start replaced the session this operation belonged to.
    #[error("Session superseded by a newer start")]
    Superseded,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to parse user or store input.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl Error {
    /// Shorthand for a transport failure.
    pub fn transport(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }

    /// Whether this failure came from talking to the store.
    #[must_use]
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::MalformedResponse { .. })
    }
}

/// Result type alias using co2dash-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
