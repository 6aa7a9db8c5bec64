//! Chart data model and the renderer boundary.
//!
//! A renderer is a pure sink with two update paths:
//!
//! - [`ChartRenderer::reinitialize`] tears down any existing instance and
//!   builds a new one from the full series. Used when a session starts.
//! - [`ChartRenderer::apply_increment`] appends to the existing instance's
//!   arrays and redraws in place. Used by live sync.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use time::PrimitiveDateTime;

use co2dash_types::{DayKey, SeriesPoint};

/// Fixed CO2 axis range in ppm.
pub const CO2_RANGE: (f64, f64) = (0.0, 1200.0);
/// Fixed temperature axis range in °C.
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 40.0);

/// Axis configuration for one day's chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisConfig {
    pub co2_range: (f64, f64),
    pub temperature_range: (f64, f64),
    /// 00:00:00 of the selected day.
    #[serde(serialize_with = "serialize_ts")]
    pub x_min: PrimitiveDateTime,
    /// 24:00:00 of the selected day.
    #[serde(serialize_with = "serialize_ts")]
    pub x_max: PrimitiveDateTime,
}

fn serialize_ts<S: serde::Serializer>(ts: &PrimitiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&co2dash_types::format_timestamp(*ts))
}

impl AxisConfig {
    /// Axes spanning the whole of `day`.
    pub fn for_day(day: DayKey) -> Self {
        Self {
            co2_range: CO2_RANGE,
            temperature_range: TEMPERATURE_RANGE,
            x_min: day.start(),
            x_max: day.end(),
        }
    }
}

/// The arrays a chart instance draws from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataModel {
    co2: Vec<SeriesPoint>,
    temperature: Vec<SeriesPoint>,
    axis: AxisConfig,
}

impl ChartDataModel {
    /// Build a model from full series.
    pub fn new(co2: &[SeriesPoint], temperature: &[SeriesPoint], axis: AxisConfig) -> Self {
        Self {
            co2: co2.to_vec(),
            temperature: temperature.to_vec(),
            axis,
        }
    }

    /// Append new points in place.
    pub fn apply_increment(&mut self, co2: &[SeriesPoint], temperature: &[SeriesPoint]) {
        self.co2.extend_from_slice(co2);
        self.temperature.extend_from_slice(temperature);
    }

    pub fn co2(&self) -> &[SeriesPoint] {
        &self.co2
    }

    pub fn temperature(&self) -> &[SeriesPoint] {
        &self.temperature
    }

    pub fn axis(&self) -> &AxisConfig {
        &self.axis
    }

    /// Number of points per channel.
    pub fn len(&self) -> usize {
        self.co2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.co2.is_empty()
    }
}

/// Drawing target for the dashboard. Holds no business logic.
pub trait ChartRenderer: Send + 'static {
    /// Destroy any prior instance and construct a new one.
    fn reinitialize(&mut self, co2: &[SeriesPoint], temperature: &[SeriesPoint], axis: &AxisConfig);

    /// Append to the existing instance and redraw without reconstructing it.
    fn apply_increment(&mut self, co2: &[SeriesPoint], temperature: &[SeriesPoint]);

    /// Destroy the current instance, if any.
    fn destroy(&mut self);
}

/// Counters and the live instance kept by [`RecordingRenderer`].
#[derive(Debug, Clone, Default)]
pub struct RecordingState {
    pub instance: Option<ChartDataModel>,
    pub created: u32,
    pub destroyed: u32,
    pub increments: u32,
}

/// Renderer that records every call, for tests and headless runs.
///
/// Clones share state, so a test can keep one handle and give another to
/// the session controller.
///
/// ```
/// use co2dash_core::chart::{ChartRenderer, RecordingRenderer};
///
/// let renderer = RecordingRenderer::new();
/// let mut handed_out = renderer.clone();
/// handed_out.destroy();
/// assert_eq!(renderer.state().destroyed, 0); // nothing to destroy yet
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn state(&self) -> RecordingState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether an instance currently exists.
    pub fn is_active(&self) -> bool {
        self.state().instance.is_some()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut RecordingState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }
}

impl ChartRenderer for RecordingRenderer {
    fn reinitialize(&mut self, co2: &[SeriesPoint], temperature: &[SeriesPoint], axis: &AxisConfig) {
        self.with_state(|s| {
            if s.instance.take().is_some() {
                s.destroyed += 1;
            }
            s.instance = Some(ChartDataModel::new(co2, temperature, *axis));
            s.created += 1;
        });
    }

    fn apply_increment(&mut self, co2: &[SeriesPoint], temperature: &[SeriesPoint]) {
        self.with_state(|s| {
            if let Some(instance) = s.instance.as_mut() {
                instance.apply_increment(co2, temperature);
                s.increments += 1;
            }
        });
    }

    fn destroy(&mut self) {
        self.with_state(|s| {
            if s.instance.take().is_some() {
                s.destroyed += 1;
            }
        });
    }
}
