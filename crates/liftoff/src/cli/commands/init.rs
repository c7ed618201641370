//! Init command

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use liftoff_core::config::{default_config_toml, DEFAULT_CONFIG_TOML};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Write a default liftoff.toml
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, "executing init command");
        let cwd = std::env::current_dir()?;
        let config_path = self
            .output
            .clone()
            .unwrap_or_else(|| cwd.join(DEFAULT_CONFIG_TOML));

        write_default_config(&config_path, self.force)?;

        match cli.format {
            OutputFormat::Json => {
                let result = serde_json::json!({
                    "config_path": config_path.to_string_lossy(),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    output::success(&format!(
                        "Created {}",
                        output::path_style().apply_to(config_path.display())
                    ));
                }
            }
        }

        Ok(())
    }
}

fn write_default_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    std::fs::write(path, default_config_toml())?;
    Ok(())
}
