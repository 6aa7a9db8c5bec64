//! Config command: manage the configuration file.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::util::Output;

pub fn cmd_config(action: &ConfigAction, path: &Path, out: &Output) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(path)?;
            out.write_str(&format!("Created {}\n", path.display()))?;
        }
        ConfigAction::Show => {
            let config = Config::load_or_default(path)?;
            let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            out.write_str(&content)?;
        }
        ConfigAction::Path => {
            out.write_str(&format!("{}\n", path.display()))?;
        }
    }
    Ok(())
}
