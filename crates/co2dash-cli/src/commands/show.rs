//! Show command: load a day and optionally follow it live.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use tracing::warn;

use co2dash_core::{
    Clock, DayCatalog, DayKey, DaySelector, ReadingsPanel, RecordStore, SessionController,
    SessionOptions, SessionPhase, SystemClock,
};

use crate::cli::{OutputArgs, OutputFormat};
use crate::format::{FormatOptions, format_panel_json, format_panel_summary, format_panel_text};
use crate::render::TerminalRenderer;
use crate::util::Output;

use super::Settings;

/// Arguments for the show and watch commands.
#[derive(Debug, Clone, Default)]
pub struct ShowArgs {
    /// Day to load; the newest catalog day when `None`.
    pub day: Option<DayKey>,
    /// Keep following live updates when the day is today.
    pub follow: bool,
    pub output: OutputArgs,
}

pub async fn cmd_show(settings: &Settings, args: ShowArgs, out: &Output) -> Result<()> {
    let store = settings.store()?;
    run_session(store, Arc::new(SystemClock), settings, &args, out, ctrl_c()).await
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C, follow until the day ends: {}", e);
        std::future::pending::<()>().await;
    }
}

pub(crate) async fn run_session<S>(
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    settings: &Settings,
    args: &ShowArgs,
    out: &Output,
    shutdown: impl Future<Output = ()>,
) -> Result<()>
where
    S: RecordStore + ?Sized + 'static,
{
    let catalog = DayCatalog::fetch(store.as_ref(), clock.as_ref())
        .await
        .context("Failed to load the day catalog")?;
    let mut selector = DaySelector::new(catalog);
    if let Some(day) = args.day {
        selector.select(day)?;
    }

    let format = args.output.format;
    let opts = settings.format_options(&args.output);
    let renderer = TerminalRenderer::new(out.clone(), format, opts);
    let mut controller = SessionController::new(store, renderer)
        .clock(clock)
        .options(SessionOptions::with_poll_interval(settings.poll_interval));

    let phase = controller
        .start_selected(&selector)
        .await
        .context("Failed to load the selected day")?;
    print_panel(&controller.panel(), format, &opts, settings.quiet, out)?;

    if phase != SessionPhase::Live || !args.follow {
        controller.stop().await;
        return Ok(());
    }

    if !settings.quiet {
        eprintln!(
            "Following live updates every {}s | Press Ctrl+C to stop",
            settings.poll_interval.as_secs()
        );
    }

    let mut updates = controller.panel_updates();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                if !settings.quiet {
                    eprintln!("\nShutting down...");
                }
                break;
            }
            panel = updates.next() => {
                let Some(panel) = panel else { break };
                if panel.is_hidden() {
                    continue;
                }
                // The day ended: the panel switches back to the historic layout.
                let ended = panel.current.is_none();
                if ended {
                    print_panel(&panel, format, &opts, settings.quiet, out)?;
                    break;
                }
                match format {
                    OutputFormat::Text => out.write_str(&format_panel_summary(&panel, &opts))?,
                    OutputFormat::Json => out.write_str(&format_panel_json(&panel, &opts)?)?,
                    OutputFormat::Csv => {}
                }
            }
        }
    }

    controller.stop().await;
    Ok(())
}

fn print_panel(
    panel: &ReadingsPanel,
    format: OutputFormat,
    opts: &FormatOptions,
    quiet: bool,
    out: &Output,
) -> Result<()> {
    match format {
        OutputFormat::Text => out.write_str(&format_panel_text(panel, opts))?,
        OutputFormat::Json => out.write_str(&format_panel_json(panel, opts)?)?,
        // CSV output stays pure data.
        OutputFormat::Csv => {
            if !quiet {
                eprint!("{}", format_panel_text(panel, opts));
            }
        }
    }
    Ok(())
}
