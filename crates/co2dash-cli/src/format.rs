//! Output formatting utilities for text, JSON, and CSV output.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

use co2dash_core::aggregate::{format_co2, format_temperature};
use co2dash_core::{AxisConfig, DayKey, ReadingsPanel, SeriesPoint};
use co2dash_types::format_timestamp;

/// CO2 level at which readings are shown as elevated.
pub const CO2_WARNING_PPM: f64 = 1000.0;
/// CO2 level at which readings are shown as high.
pub const CO2_DANGER_PPM: f64 = 1400.0;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
/// Columns of a day sparkline; one per half hour.
pub const SPARK_WIDTH: usize = 48;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Omit header row in CSV output.
    pub no_header: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            ..Self::default()
        }
    }

    /// Create with no_header option for CSV output.
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    /// Create with compact JSON option.
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    /// CO2 value colored by level.
    #[must_use]
    pub fn co2(&self, ppm: f64) -> String {
        let text = format_co2(ppm);
        if self.no_color {
            text
        } else if ppm >= CO2_DANGER_PPM {
            format!("{}", text.red())
        } else if ppm >= CO2_WARNING_PPM {
            format!("{}", text.yellow())
        } else {
            format!("{}", text.green())
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("{}", text.bold())
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("{}", text.dimmed())
        }
    }
}

// ============================================================================
// Days
// ============================================================================

pub fn format_days_text(days: &[DayKey], opts: &FormatOptions) -> String {
    if days.is_empty() {
        return "No days available\n".to_string();
    }
    let mut out = String::new();
    for (i, day) in days.iter().enumerate() {
        if i == 0 {
            out.push_str(&format!("{}  {}\n", day, opts.dim("(newest)")));
        } else {
            out.push_str(&format!("{}\n", day));
        }
    }
    out
}

pub fn format_days_json(days: &[DayKey], opts: &FormatOptions) -> Result<String> {
    opts.as_json(&days)
}

pub fn format_days_csv(days: &[DayKey], opts: &FormatOptions) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if !opts.no_header {
        writer.write_record(["day"])?;
    }
    for day in days {
        writer.write_record([day.to_string()])?;
    }
    finish_csv(writer)
}

// ============================================================================
// Readings panel
// ============================================================================

pub fn format_panel_text(panel: &ReadingsPanel, opts: &FormatOptions) -> String {
    let mut out = String::new();
    if let Some(status) = &panel.status {
        out.push_str(&opts.heading(status));
        out.push('\n');
    }
    if let Some(r) = &panel.current {
        out.push_str(&format!(
            "Current: {}  CO2 {}  Temperature {}\n",
            format_timestamp(r.time),
            opts.co2(r.co2),
            format_temperature(r.temperature)
        ));
    }
    if let Some(aggregates) = &panel.aggregates {
        let [max_co2, min_co2, max_temp, min_temp] = aggregates.lines();
        out.push_str(&format!("{}\n{}\n{}\n{}\n", max_co2, min_co2, max_temp, min_temp));
    }
    out
}

/// One-line summary for live updates.
pub fn format_panel_summary(panel: &ReadingsPanel, opts: &FormatOptions) -> String {
    match &panel.aggregates {
        Some(a) => format!(
            "{} CO2 {}-{} | Temperature {}-{}\n",
            opts.dim("range"),
            format_co2(a.co2.min),
            format_co2(a.co2.max),
            format_temperature(a.temperature.min),
            format_temperature(a.temperature.max)
        ),
        None => format_panel_text(panel, opts),
    }
}

pub fn format_panel_json(panel: &ReadingsPanel, opts: &FormatOptions) -> Result<String> {
    opts.as_json(&json!({ "event": "panel", "panel": panel }))
}

// ============================================================================
// Chart
// ============================================================================

/// Render `points` as one column per time bucket across the axis span.
/// Each column shows the bucket's highest value; empty buckets are blank.
pub fn sparkline(points: &[SeriesPoint], range: (f64, f64), axis: &AxisConfig, width: usize) -> String {
    let span = (axis.x_max - axis.x_min).whole_seconds().max(1);
    let mut buckets: Vec<Option<f64>> = vec![None; width];

    for p in points {
        let offset = (p.x - axis.x_min).whole_seconds().clamp(0, span - 1);
        let idx = (offset as usize * width) / span as usize;
        let slot = &mut buckets[idx.min(width - 1)];
        *slot = Some(slot.map_or(p.y, |v| v.max(p.y)));
    }

    let (lo, hi) = range;
    buckets
        .into_iter()
        .map(|b| match b {
            None => ' ',
            Some(y) => {
                let norm = ((y - lo) / (hi - lo)).clamp(0.0, 1.0);
                SPARK_LEVELS[(norm * (SPARK_LEVELS.len() - 1) as f64).round() as usize]
            }
        })
        .collect()
}

pub fn format_chart_text(
    co2: &[SeriesPoint],
    temperature: &[SeriesPoint],
    axis: &AxisConfig,
    opts: &FormatOptions,
) -> String {
    let mut out = String::new();
    out.push_str(&opts.heading(&format!(
        "{} to {} ({} points)",
        format_timestamp(axis.x_min),
        format_timestamp(axis.x_max),
        co2.len()
    )));
    out.push('\n');
    out.push_str(&format!(
        "CO2 {:>5}-{:<5} |{}|\n",
        axis.co2_range.0,
        axis.co2_range.1,
        sparkline(co2, axis.co2_range, axis, SPARK_WIDTH)
    ));
    out.push_str(&format!(
        "Temp {:>4}-{:<5} |{}|\n",
        axis.temperature_range.0,
        axis.temperature_range.1,
        sparkline(temperature, axis.temperature_range, axis, SPARK_WIDTH)
    ));
    out
}

pub fn format_points_text(co2: &[SeriesPoint], temperature: &[SeriesPoint], opts: &FormatOptions) -> String {
    co2.iter()
        .zip(temperature)
        .map(|(c, t)| {
            format!(
                "{} {}  CO2 {}  Temperature {}\n",
                opts.dim("+"),
                format_timestamp(c.x),
                opts.co2(c.y),
                format_temperature(t.y)
            )
        })
        .collect()
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

#[derive(Serialize)]
struct CsvRow<'a> {
    time: &'a str,
    co2: f64,
    temperature: f64,
}

pub fn format_points_csv(
    co2: &[SeriesPoint],
    temperature: &[SeriesPoint],
    with_header: bool,
) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(with_header)
        .from_writer(Vec::new());
    for (c, t) in co2.iter().zip(temperature) {
        let time = format_timestamp(c.x);
        writer.serialize(CsvRow {
            time: &time,
            co2: c.y,
            temperature: t.y,
        })?;
    }
    finish_csv(writer)
}

pub fn format_chart_json(
    co2: &[SeriesPoint],
    temperature: &[SeriesPoint],
    axis: &AxisConfig,
    opts: &FormatOptions,
) -> Result<String> {
    opts.as_json(&json!({
        "event": "chart",
        "axis": axis,
        "co2": co2,
        "temperature": temperature,
    }))
}

pub fn format_increment_json(
    co2: &[SeriesPoint],
    temperature: &[SeriesPoint],
    opts: &FormatOptions,
) -> Result<String> {
    opts.as_json(&json!({
        "event": "increment",
        "co2": co2,
        "temperature": temperature,
    }))
}
