//! Core types for co2dash sensor data.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

use crate::error::{ParseError, ParseResult};

const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Parse a store timestamp (`YYYY-MM-DD HH:mm:ss`).
///
/// # Examples
///
/// ```
/// use co2dash_types::parse_timestamp;
///
/// let ts = parse_timestamp("2024-01-02 08:00:00").unwrap();
/// assert_eq!(ts.hour(), 8);
/// assert!(parse_timestamp("2024-01-02T08:00:00Z").is_err());
/// ```
pub fn parse_timestamp(input: &str) -> ParseResult<PrimitiveDateTime> {
    PrimitiveDateTime::parse(input.trim(), TIMESTAMP_FORMAT).map_err(|e| {
        ParseError::InvalidTimestamp {
            input: input.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Format a timestamp the way the store emits it.
#[must_use]
pub fn format_timestamp(ts: PrimitiveDateTime) -> String {
    format!(
        "{} {:02}:{:02}:{:02}",
        DayKey::from(ts.date()),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}

/// A calendar day used to select and bucket records.
///
/// Displays and parses as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(Date);

impl DayKey {
    /// Wrap a calendar date.
    #[must_use]
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    /// The day a timestamp falls on.
    #[must_use]
    pub fn of(ts: PrimitiveDateTime) -> Self {
        Self(ts.date())
    }

    /// The underlying date.
    #[must_use]
    pub const fn date(&self) -> Date {
        self.0
    }

    /// The following calendar day, if representable.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    /// 00:00:00 on this day.
    #[must_use]
    pub fn start(&self) -> PrimitiveDateTime {
        self.0.midnight()
    }

    /// 24:00:00 on this day, i.e. midnight of the following day.
    #[must_use]
    pub fn end(&self) -> PrimitiveDateTime {
        self.0
            .next_day()
            .map_or(PrimitiveDateTime::new(Date::MAX, Time::MAX), Date::midnight)
    }

    /// Whether a timestamp falls within this day.
    #[must_use]
    pub fn contains(&self, ts: PrimitiveDateTime) -> bool {
        ts.date() == self.0
    }
}

impl From<Date> for DayKey {
    fn from(date: Date) -> Self {
        Self(date)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl FromStr for DayKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s.trim(), DAY_FORMAT)
            .map(Self)
            .map_err(|e| ParseError::InvalidDay {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(feature = "serde")]
impl Serialize for DayKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single stored measurement.
///
/// The store emits `{id, time, co2, temperature}`; numeric fields may arrive
/// either as JSON numbers or as numeric strings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    /// Monotonically increasing store identifier.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::wire::id"))]
    pub id: i64,
    /// When the measurement was taken (store local time).
    #[cfg_attr(feature = "serde", serde(with = "crate::wire::timestamp"))]
    pub time: PrimitiveDateTime,
    /// CO2 concentration in ppm.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::wire::number"))]
    pub co2: f64,
    /// Temperature in °C.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::wire::number"))]
    pub temperature: f64,
}

impl Record {
    /// Project this record onto one channel.
    #[must_use]
    pub fn point(&self, channel: Channel) -> SeriesPoint {
        SeriesPoint {
            x: self.time,
            y: match channel {
                Channel::Co2 => self.co2,
                Channel::Temperature => self.temperature,
            },
        }
    }

    /// The calendar day this record belongs to.
    #[must_use]
    pub fn day(&self) -> DayKey {
        DayKey::of(self.time)
    }
}

/// Marker for the start of a contiguous range of stored data.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DayBoundary {
    /// Identifier of the first record in the range.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::wire::id"))]
    pub id: i64,
    /// Timestamp of the first record in the range.
    #[cfg_attr(feature = "serde", serde(with = "crate::wire::timestamp"))]
    pub time: PrimitiveDateTime,
}

impl DayBoundary {
    /// The day the range begins on.
    #[must_use]
    pub fn day(&self) -> DayKey {
        DayKey::of(self.time)
    }
}

/// One point of a chart series.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeriesPoint {
    /// Timestamp.
    #[cfg_attr(feature = "serde", serde(with = "crate::wire::timestamp"))]
    pub x: PrimitiveDateTime,
    /// Value.
    pub y: f64,
}

/// The two measured channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Channel {
    /// CO2 concentration (ppm).
    Co2,
    /// Temperature (°C).
    Temperature,
}

impl Channel {
    /// Unit suffix used in displays.
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Channel::Co2 => "ppm",
            Channel::Temperature => "°C",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Co2 => write!(f, "CO2"),
            Channel::Temperature => write!(f, "Temperature"),
        }
    }
}
