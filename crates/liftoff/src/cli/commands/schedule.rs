//! Schedule command

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde_json::json;
use tracing::info;

use liftoff_core::{load_config_or_default, Config};
use liftoff_queue::{HttpQueue, HttpQueueConfig, InMemoryQueue, QueueService};
use liftoff_tasks::harness::HARNESS_REVISION_ENV;
use liftoff_tasks::{
    persist, resolve_harness, GraphSnapshot, GraphSubmitter, IdGenerator, PipelineAssembler,
    ReporterRegistry, SlugIds, SubmitReporter, TaskBuilder, TaskGraph,
};

use super::RunArgs;
use crate::cli::output::{self, ConsoleReporter};
use crate::cli::{Cli, OutputFormat};

/// Build the task graph for this run, submit it and persist the snapshot
#[derive(Debug, Args)]
pub struct ScheduleCommand {
    #[command(flatten)]
    pub run: RunArgs,

    /// Directory the chain-of-trust files are written to
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Submit to an in-memory queue instead of the real one
    #[arg(long)]
    pub dry_run: bool,
}

/// Outcome of a successful schedule run
pub(crate) struct Scheduled {
    pub graph: TaskGraph,
    pub snapshot: GraphSnapshot,
    pub task_graph_path: PathBuf,
}

impl ScheduleCommand {
    /// Execute the schedule command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dry_run = self.dry_run, output = %self.output.display(), "executing schedule command");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let (config, config_path) = load_config_or_default(&cwd)?;
        let context = self.run.context()?;

        if cli.is_interactive_text() {
            println!("{}", output::header("Scheduling task graph"));
            if let Some(path) = &config_path {
                println!(
                    "{}",
                    output::key_value("config", &output::path_style().apply_to(path.display()).to_string())
                );
            }
            println!("{}", output::key_value("task group", context.task_group_id()));
            println!("{}", output::key_value("commit", context.commit()));
            if self.dry_run {
                output::warning("Dry run: tasks go to an in-memory queue");
            }
        }

        let queue: Arc<dyn QueueService> = if self.dry_run {
            Arc::new(dry_run_queue(&config, context.task_group_id()))
        } else {
            Arc::new(HttpQueue::new(HttpQueueConfig {
                queue_url: config.queue.queue_url.clone(),
                index_url: config.queue.index_url.clone(),
                timeout: Duration::from_secs(config.queue.timeout_secs),
            })?)
        };

        let mut reporters = ReporterRegistry::new();
        if cli.is_interactive_text() {
            reporters.register(Arc::new(ConsoleReporter));
        }

        let builder = TaskBuilder::new(context, config);
        let scheduled = schedule(&builder, queue, Arc::new(reporters), &SlugIds, &self.output).await?;

        match cli.format {
            OutputFormat::Json => {
                let summary = json!({
                    "task_group_id": builder.context().task_group_id(),
                    "groups": scheduled.graph.groups().len(),
                    "tasks": scheduled.snapshot.task_ids().collect::<Vec<_>>(),
                    "task_graph": scheduled.task_graph_path.to_string_lossy(),
                    "dry_run": self.dry_run,
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    output::success(&format!(
                        "Wrote {}",
                        output::path_style().apply_to(scheduled.task_graph_path.display())
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Assemble, submit and persist the graph for one run
pub(crate) async fn schedule(
    builder: &TaskBuilder,
    queue: Arc<dyn QueueService>,
    reporter: Arc<dyn SubmitReporter>,
    ids: &dyn IdGenerator,
    output: &Path,
) -> anyhow::Result<Scheduled> {
    let assembler = PipelineAssembler::new(builder, ids);

    let harness = if assembler.needs_harness() {
        let index_path = &builder.config().pipeline.harness_index_path;
        Some(resolve_harness(queue.as_ref(), index_path).await?)
    } else {
        None
    };

    let graph = assembler.assemble(harness.as_ref())?;
    info!(groups = graph.groups().len(), tasks = graph.len(), "task graph assembled");

    let snapshot = GraphSubmitter::new(queue, reporter).submit(&graph).await?;
    let task_graph_path = persist(output, &snapshot)?;

    Ok(Scheduled {
        graph,
        snapshot,
        task_graph_path,
    })
}

/// Queue standing in for the real one: it knows the decision task and
/// indexes a harness task when performance tests need one.
fn dry_run_queue(config: &Config, task_group_id: &str) -> InMemoryQueue {
    let queue = InMemoryQueue::new().with_existing_task(task_group_id, json!({}));
    if config.pipeline.performance_tests.is_empty() {
        return queue;
    }
    queue.with_indexed_task(
        config.pipeline.harness_index_path.clone(),
        "dry-run-harness",
        json!({ "payload": { "env": { HARNESS_REVISION_ENV: "dry-run" } } }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftoff_core::config::PerformanceTestConfig;
    use liftoff_core::{Architecture, RunContext};
    use liftoff_queue::QueueCall;
    use liftoff_tasks::chain_of_trust::{ACTIONS_FILE, PARAMETERS_FILE, TASK_GRAPH_FILE};
    use liftoff_tasks::{load_task_graph, CollectingReporter, SequentialIds, SubmitEvent};
    use tempfile::TempDir;

    const ANCHOR: &str = "decision0000000000000";

    fn builder(config: Config) -> TaskBuilder {
        let context = RunContext::builder()
            .task_group_id(ANCHOR)
            .repo_url("https://github.com/example/fenix")
            .branch("main")
            .commit("abcdef0123456789")
            .date("2019-03-07")
            .build(chrono::Utc::now().date_naive())
            .unwrap();
        TaskBuilder::new(context, config)
    }

    #[tokio::test]
    async fn test_dry_run_schedule_persists_snapshot() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        let queue = Arc::new(dry_run_queue(&config, ANCHOR));
        let reporter = Arc::new(CollectingReporter::default());
        let ids = SequentialIds::new("task");

        let scheduled = schedule(
            &builder(config),
            queue.clone(),
            reporter.clone(),
            &ids,
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(scheduled.snapshot.len(), scheduled.graph.len());
        let loaded = load_task_graph(&scheduled.task_graph_path).unwrap();
        assert_eq!(loaded, scheduled.snapshot);
        assert!(dir.path().join(ACTIONS_FILE).exists());
        assert!(dir.path().join(PARAMETERS_FILE).exists());

        let creates = queue
            .calls()
            .await
            .into_iter()
            .filter(|call| matches!(call, QueueCall::Create(_)))
            .count();
        assert_eq!(creates, scheduled.graph.len());
        assert!(reporter
            .events()
            .iter()
            .any(|e| matches!(e, SubmitEvent::Completed { .. })));
    }

    #[tokio::test]
    async fn test_dry_run_schedule_resolves_harness() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.pipeline.performance_tests = vec![PerformanceTestConfig {
            test: "raptor-speedometer".to_string(),
            architecture: Architecture::Aarch64,
            symbol: "sp".to_string(),
            force_64bit: false,
            extra_options: Vec::new(),
        }];
        let queue = Arc::new(dry_run_queue(&config, ANCHOR));
        let ids = SequentialIds::new("task");

        let scheduled = schedule(
            &builder(config),
            queue,
            Arc::new(CollectingReporter::default()),
            &ids,
            dir.path(),
        )
        .await
        .unwrap();

        assert!(scheduled.graph.external().contains("dry-run-harness"));
    }

    #[tokio::test]
    async fn test_schedule_without_anchor_fails() {
        let dir = TempDir::new().unwrap();
        let queue = Arc::new(InMemoryQueue::new());
        let ids = SequentialIds::new("task");

        let result = schedule(
            &builder(Config::default()),
            queue,
            Arc::new(CollectingReporter::default()),
            &ids,
            dir.path(),
        )
        .await;

        assert!(result.is_err());
        assert!(!dir.path().join(TASK_GRAPH_FILE).exists());
    }
}
