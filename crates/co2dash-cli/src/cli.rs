//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use co2dash_types::DayKey;

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Reusable output format arguments
#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Omit header row in CSV output (useful for appending)
    #[arg(long)]
    pub no_header: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long)]
    pub compact: bool,
}

#[derive(Debug, Parser)]
#[command(name = "co2dash")]
#[command(author, version, about = "Terminal dashboard for CO2 and temperature records", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Record store URL (directory hosting the store scripts)
    #[arg(long, global = true, env = "CO2DASH_URL")]
    pub url: Option<String>,

    /// Seconds between live updates (overrides config)
    #[arg(long, global = true, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the days that can be shown, newest first
    Days {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show a day's readings; follows live updates when the day is today
    Show {
        /// Day to show (YYYY-MM-DD). Defaults to the newest day
        #[arg(short, long)]
        day: Option<DayKey>,

        /// Print the loaded day and exit without following live updates
        #[arg(long)]
        once: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Follow today's readings until interrupted
    Watch {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
}
