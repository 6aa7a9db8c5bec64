//! Terminal drawing target for the session controller.

use anyhow::Result;
use tracing::warn;

use co2dash_core::{AxisConfig, ChartDataModel, ChartRenderer, SeriesPoint};

use crate::cli::OutputFormat;
use crate::format::{
    FormatOptions, format_chart_json, format_chart_text, format_increment_json,
    format_points_csv, format_points_text,
};
use crate::util::Output;

/// Draws the chart as text, JSON events, or CSV rows.
///
/// A new instance prints the whole day; increments print only the new
/// points. The CSV header is written once per process so a reloaded chart
/// keeps appending to the same table.
pub struct TerminalRenderer {
    out: Output,
    format: OutputFormat,
    opts: FormatOptions,
    instance: Option<ChartDataModel>,
    header_written: bool,
}

impl TerminalRenderer {
    pub fn new(out: Output, format: OutputFormat, opts: FormatOptions) -> Self {
        Self {
            out,
            format,
            opts,
            instance: None,
            header_written: opts.no_header,
        }
    }

    fn emit(&self, content: Result<String>) {
        let written = content.and_then(|c| Ok(self.out.write_str(&c)?));
        if let Err(e) = written {
            warn!("Failed to write chart output: {}", e);
        }
    }

    fn csv_rows(&mut self, co2: &[SeriesPoint], temperature: &[SeriesPoint]) -> Result<String> {
        let rows = format_points_csv(co2, temperature, !self.header_written)?;
        self.header_written = true;
        Ok(rows)
    }
}

impl ChartRenderer for TerminalRenderer {
    fn reinitialize(&mut self, co2: &[SeriesPoint], temperature: &[SeriesPoint], axis: &AxisConfig) {
        self.destroy();
        let content = match self.format {
            OutputFormat::Text => Ok(format_chart_text(co2, temperature, axis, &self.opts)),
            OutputFormat::Json => format_chart_json(co2, temperature, axis, &self.opts),
            OutputFormat::Csv => self.csv_rows(co2, temperature),
        };
        self.emit(content);
        self.instance = Some(ChartDataModel::new(co2, temperature, *axis));
    }

    fn apply_increment(&mut self, co2: &[SeriesPoint], temperature: &[SeriesPoint]) {
        let Some(instance) = self.instance.as_mut() else {
            return;
        };
        instance.apply_increment(co2, temperature);

        let content = match self.format {
            OutputFormat::Text => Ok(format_points_text(co2, temperature, &self.opts)),
            OutputFormat::Json => format_increment_json(co2, temperature, &self.opts),
            OutputFormat::Csv => self.csv_rows(co2, temperature),
        };
        self.emit(content);
    }

    fn destroy(&mut self) {
        self.instance = None;
    }
}
