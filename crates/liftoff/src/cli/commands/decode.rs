//! Decode command

use clap::Args;
use serde::Serialize;
use tracing::info;

use liftoff_core::{BuildKind, Variant};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Decode a build variant name into architecture and build type
#[derive(Debug, Args)]
pub struct DecodeCommand {
    /// Variant name (e.g. aarch64NightlyRelease)
    pub variant: String,
}

#[derive(Debug, Serialize)]
struct Decoded {
    #[serde(flatten)]
    variant: Variant,
    kind: Option<BuildKind>,
    label: String,
    gradle_name: String,
}

impl DecodeCommand {
    /// Execute the decode command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(variant = %self.variant, "executing decode command");
        let decoded = decode(&self.variant)?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&decoded)?);
            }
            OutputFormat::Text => {
                if cli.quiet {
                    return Ok(());
                }
                println!("{}", output::header(&decoded.variant.name));
                println!(
                    "{}",
                    output::key_value("architecture", decoded.variant.architecture.as_str())
                );
                println!("{}", output::key_value("build type", &decoded.variant.build_type));
                match decoded.kind {
                    Some(kind) => println!("{}", output::key_value("kind", kind.group_symbol())),
                    None => output::warning("Build type is not mapped to a build kind"),
                }
                println!("{}", output::key_value("label", &decoded.label));
                println!("{}", output::key_value("gradle", &decoded.gradle_name));
            }
        }

        Ok(())
    }
}

fn decode(name: &str) -> anyhow::Result<Decoded> {
    let variant = Variant::decode(name)?;
    Ok(Decoded {
        kind: variant.kind().ok(),
        label: variant.label(),
        gradle_name: variant.gradle_name(),
        variant,
    })
}
