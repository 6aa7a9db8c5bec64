//! Min/max tracking over the loaded series.
//!
//! Aggregates are recomputed over the whole series on every change. A day
//! holds a bounded number of samples, so the linear pass is cheap.

use std::fmt;

use serde::Serialize;

use co2dash_types::SeriesPoint;

/// Minimum and maximum of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

/// Compute the extremes of `series`. Returns `None` only for an empty series.
pub fn compute_min_max(series: &[SeriesPoint]) -> Option<MinMax> {
    let mut values = series.iter().map(|p| p.y);
    let first = values.next()?;
    Some(values.fold(MinMax { min: first, max: first }, |acc, y| MinMax {
        min: acc.min.min(y),
        max: acc.max.max(y),
    }))
}

/// Render a CO2 value as an integer ppm reading.
///
/// ```
/// assert_eq!(co2dash_core::aggregate::format_co2(420.0), "420ppm");
/// ```
pub fn format_co2(value: f64) -> String {
    format!("{:.0}ppm", value)
}

/// Render a temperature to one decimal place.
///
/// ```
/// assert_eq!(co2dash_core::aggregate::format_temperature(21.34), "21.3°C");
/// ```
pub fn format_temperature(value: f64) -> String {
    format!("{:.1}°C", value)
}

/// Extremes of both channels over the current session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aggregates {
    pub co2: MinMax,
    pub temperature: MinMax,
}

impl Aggregates {
    /// Compute both channels. `None` when either series is empty.
    pub fn compute(co2: &[SeriesPoint], temperature: &[SeriesPoint]) -> Option<Self> {
        Some(Self {
            co2: compute_min_max(co2)?,
            temperature: compute_min_max(temperature)?,
        })
    }

    /// The four readings-panel lines.
    pub fn lines(&self) -> [String; 4] {
        [
            format!("Max CO2 concentration: {}", format_co2(self.co2.max)),
            format!("Min CO2 concentration: {}", format_co2(self.co2.min)),
            format!("Max temperature: {}", format_temperature(self.temperature.max)),
            format!("Min temperature: {}", format_temperature(self.temperature.min)),
        ]
    }
}

impl fmt::Display for Aggregates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}
