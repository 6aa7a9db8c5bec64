//! Error types for data parsing in co2dash-types.

use thiserror::Error;

/// Errors that can occur when parsing dashboard data.
///
/// This error type is transport-agnostic and does not include
/// network errors (those belong in co2dash-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// A calendar day key was not in `YYYY-MM-DD` form.
    #[error("Invalid day '{input}': {reason}")]
    InvalidDay {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timestamp was not in `YYYY-MM-DD HH:mm:ss` form.
    #[error("Invalid timestamp '{input}': {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type alias using co2dash-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
