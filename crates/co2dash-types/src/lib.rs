//! Platform-agnostic types for the co2dash environmental dashboard.
//!
//! This crate provides the data model shared by the dashboard core and its
//! front ends: stored records, day-boundary markers, calendar day keys and
//! chart series points, plus parsing of the store's wire format.
//!
//! # Example
//!
//! ```
//! use co2dash_types::{Channel, DayKey, Record};
//!
//! let json = r#"{"id": 5, "time": "2024-01-02 08:00:00", "co2": "420", "temperature": "21.3"}"#;
//! let record: Record = serde_json::from_str(json).unwrap();
//!
//! assert_eq!(record.day(), "2024-01-02".parse::<DayKey>().unwrap());
//! assert_eq!(record.point(Channel::Co2).y, 420.0);
//! ```

pub mod error;
pub mod types;
#[cfg(feature = "serde")]
mod wire;

pub use error::{ParseError, ParseResult};
pub use types::{
    Channel, DayBoundary, DayKey, Record, SeriesPoint, format_timestamp, parse_timestamp,
};
