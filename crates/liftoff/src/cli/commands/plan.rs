//! Plan command

use clap::Args;
use tracing::info;

use liftoff_core::load_config_or_default;
use liftoff_tasks::{HarnessTask, PipelineAssembler, SequentialIds, TaskBuilder, TaskGraph};

use super::RunArgs;
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Harness task id shown when the plan needs one
const PLACEHOLDER_HARNESS: &str = "harness";

/// Show the task groups a run would submit
#[derive(Debug, Args)]
pub struct PlanCommand {
    #[command(flatten)]
    pub run: RunArgs,

    /// Print full task definitions instead of a summary
    #[arg(long)]
    pub definitions: bool,
}

impl PlanCommand {
    /// Execute the plan command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(definitions = self.definitions, "executing plan command");
        let cwd = std::env::current_dir()?;
        let (config, _) = load_config_or_default(&cwd)?;
        let builder = TaskBuilder::new(self.run.offline_context()?, config);
        let graph = plan(&builder)?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&graph)?);
            }
            OutputFormat::Text if self.definitions => {
                for (id, definition) in graph.tasks() {
                    println!("{}", output::header(id));
                    println!("{}", serde_json::to_string_pretty(definition)?);
                }
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!(
                        "{}",
                        output::header(&format!(
                            "{} tasks in {} groups",
                            graph.len(),
                            graph.groups().len()
                        ))
                    );
                }
                print!("{}", graph.execution_plan());
            }
        }

        Ok(())
    }
}

/// Assemble the graph with predictable ids and a placeholder harness
fn plan(builder: &TaskBuilder) -> anyhow::Result<TaskGraph> {
    let ids = SequentialIds::new("task");
    let assembler = PipelineAssembler::new(builder, &ids);
    let harness = assembler.needs_harness().then(|| HarnessTask {
        task_id: PLACEHOLDER_HARNESS.to_string(),
        revision: "tip".to_string(),
    });
    Ok(assembler.assemble(harness.as_ref())?)
}
