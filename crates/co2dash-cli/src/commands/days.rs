//! Days command: list the selectable days.

use anyhow::{Context, Result};

use co2dash_core::{DayCatalog, SystemClock};

use crate::cli::{OutputArgs, OutputFormat};
use crate::format::{format_days_csv, format_days_json, format_days_text};
use crate::util::Output;

use super::Settings;

pub async fn cmd_days(settings: &Settings, output: &OutputArgs, out: &Output) -> Result<()> {
    let store = settings.store()?;
    let catalog = DayCatalog::fetch(store.as_ref(), &SystemClock)
        .await
        .context("Failed to load the day catalog")?;

    let opts = settings.format_options(output);
    let content = match output.format {
        OutputFormat::Text => format_days_text(catalog.days(), &opts),
        OutputFormat::Json => format_days_json(catalog.days(), &opts)?,
        OutputFormat::Csv => format_days_csv(catalog.days(), &opts)?,
    };
    out.write_str(&content)?;
    Ok(())
}
