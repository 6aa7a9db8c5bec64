//! Serde helpers for the store's JSON shape.
//!
//! The store is backed by a SQL database whose driver stringifies every
//! column, so ids and measurements may arrive as `"420"` rather than `420`.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Deserialize an integer id from a number or a numeric string.
pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Loose::deserialize(deserializer)? {
        Loose::Int(v) => Ok(v),
        Loose::Float(v) if v.fract() == 0.0 => Ok(v as i64),
        Loose::Float(v) => Err(de::Error::custom(format!("id is not an integer: {v}"))),
        Loose::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("id is not an integer: {s:?}"))),
    }
}

/// Deserialize a measurement from a number or a numeric string.
pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Loose::deserialize(deserializer)? {
        Loose::Int(v) => Ok(v as f64),
        Loose::Float(v) => Ok(v),
        Loose::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| de::Error::custom(format!("not a number: {s:?}"))),
    }
}

/// `YYYY-MM-DD HH:mm:ss` timestamps.
pub mod timestamp {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::PrimitiveDateTime;

    use crate::types::{format_timestamp, parse_timestamp};

    pub fn serialize<S: Serializer>(ts: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(*ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<PrimitiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_timestamp(&s).map_err(serde::de::Error::custom)
    }
}
