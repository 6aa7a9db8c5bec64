mod cli;
mod commands;
mod config;
mod format;
mod render;
mod util;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use co2dash_core::{Clock, SystemClock};

use crate::cli::{Cli, Commands};
use crate::commands::{Settings, ShowArgs, cmd_config, cmd_days, cmd_show};
use crate::config::Config;
use crate::util::Output;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Logs go to stderr so stdout stays clean for JSON and CSV.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let out = Output::open(cli.output.as_ref())?;

    match &cli.command {
        // Config management works without a store URL.
        Commands::Config { action } => cmd_config(action, &config_path, &out),
        Commands::Days { output } => {
            let settings = load_settings(&cli, &config_path)?;
            cmd_days(&settings, output, &out).await
        }
        Commands::Show { day, once, output } => {
            let settings = load_settings(&cli, &config_path)?;
            let args = ShowArgs {
                day: *day,
                follow: !once,
                output: output.clone(),
            };
            cmd_show(&settings, args, &out).await
        }
        Commands::Watch { output } => {
            let settings = load_settings(&cli, &config_path)?;
            let args = ShowArgs {
                day: Some(SystemClock.today()),
                follow: true,
                output: output.clone(),
            };
            cmd_show(&settings, args, &out).await
        }
    }
}

fn load_settings(cli: &Cli, config_path: &Path) -> Result<Settings> {
    let config = Config::load_or_default(config_path)?;
    Settings::resolve(cli, &config)
}
