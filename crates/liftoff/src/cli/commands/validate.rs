//! Validate command

use clap::Args;
use console::style;
use tracing::info;

use liftoff_core::config::load_config_from_dir;

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Validate the configuration file
#[derive(Debug, Args)]
pub struct ValidateCommand {}

impl ValidateCommand {
    /// Execute the validate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing validate command");
        let cwd = std::env::current_dir()?;

        let (config_path, error) = match load_config_from_dir(&cwd) {
            Ok((_, path)) => (Some(path), None),
            Err(e) => (None, Some(e)),
        };

        match cli.format {
            OutputFormat::Json => {
                let result = serde_json::json!({
                    "valid": error.is_none(),
                    "config_path": config_path.as_ref().map(|p| p.to_string_lossy().to_string()),
                    "error": error.as_ref().map(|e| e.to_string()),
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    if let Some(path) = &config_path {
                        println!(
                            "Config: {}",
                            output::path_style().apply_to(path.display())
                        );
                    }
                    if error.is_none() {
                        println!("{}", style("✓ Configuration is valid").green().bold());
                    }
                }
            }
        }

        match error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
