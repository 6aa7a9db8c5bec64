//! Command implementations for the CLI.

mod config;
mod days;
mod show;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use co2dash_core::{Endpoints, StoreClient};

use crate::cli::{Cli, OutputArgs};
use crate::config::{Config, MAX_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS};
use crate::format::FormatOptions;

pub use config::cmd_config;
pub use days::cmd_days;
pub use show::{ShowArgs, cmd_show};

/// Effective settings after merging flags, environment and config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub url: String,
    pub endpoints: Endpoints,
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub no_color: bool,
    pub quiet: bool,
}

impl Settings {
    /// Flags win over the config file.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        config.validate()?;

        let url = cli
            .url
            .clone()
            .or_else(|| config.store.url.clone())
            .context(
                "No store URL configured. Pass --url, set CO2DASH_URL, or set store.url in the config file",
            )?;

        let poll_interval = match cli.interval {
            Some(secs) if !(MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&secs) => {
                bail!(
                    "--interval must be between {} and {} seconds",
                    MIN_POLL_INTERVAL_SECS,
                    MAX_POLL_INTERVAL_SECS
                )
            }
            Some(secs) => Duration::from_secs(secs),
            None => config.live.poll_interval(),
        };

        Ok(Self {
            url,
            endpoints: config.store.endpoints.clone(),
            timeout: config.store.timeout_secs.map(Duration::from_secs),
            poll_interval,
            no_color: cli.no_color || config.display.no_color,
            quiet: cli.quiet,
        })
    }

    /// Build the HTTP store client.
    pub fn store(&self) -> Result<Arc<StoreClient>> {
        let client = match self.timeout {
            Some(timeout) => StoreClient::with_timeout(&self.url, timeout),
            None => StoreClient::new(&self.url),
        }
        .context("Failed to create store client")?;
        Ok(Arc::new(client.endpoints(self.endpoints.clone())))
    }

    pub fn format_options(&self, output: &OutputArgs) -> FormatOptions {
        FormatOptions::new(self.no_color)
            .with_no_header(output.no_header)
            .with_compact(output.compact)
    }
}
