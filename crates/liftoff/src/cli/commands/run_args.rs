//! Run parameters shared by schedule and plan

use chrono::Utc;
use clap::Args;

use liftoff_core::{Priority, RunContext};

/// Parameters of the decision-task run, read from flags or the environment
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Decision task id; also the task group id and anchor dependency
    #[arg(long, env = "TASK_ID")]
    pub task_id: Option<String>,

    /// Repository the run was triggered for
    #[arg(long, env = "MOBILE_HEAD_REPOSITORY")]
    pub repository: Option<String>,

    /// Branch the run was triggered for
    #[arg(long, env = "MOBILE_HEAD_BRANCH")]
    pub branch: Option<String>,

    /// Commit the run was triggered for
    #[arg(long, env = "MOBILE_HEAD_REV")]
    pub commit: Option<String>,

    /// Scheduler id recorded on every task
    #[arg(long, env = "SCHEDULER_ID")]
    pub scheduler_id: Option<String>,

    /// Release date (YYYY-MM-DD or RFC 3339); defaults to today
    #[arg(long, env = "BUILD_DATE")]
    pub date: Option<String>,

    /// Trust level of the worker pools (1-3)
    #[arg(long, env = "TRUST_LEVEL", default_value_t = 1)]
    pub trust_level: u8,

    /// Use dep signing and staging secrets
    #[arg(long, env = "STAGING", value_parser = clap::builder::BoolishValueParser::new())]
    pub staging: bool,

    /// Priority of the scheduled tasks
    #[arg(long, default_value = "lowest")]
    pub priority: Priority,
}

impl RunArgs {
    /// Freeze the parameters into a run context
    pub fn context(&self) -> anyhow::Result<RunContext> {
        let mut builder = RunContext::builder()
            .staging(self.staging)
            .trust_level(self.trust_level)
            .priority(self.priority);

        if let Some(id) = &self.task_id {
            builder = builder.task_group_id(id);
        }
        if let Some(repo) = &self.repository {
            builder = builder.repo_url(repo);
        }
        if let Some(branch) = &self.branch {
            builder = builder.branch(branch);
        }
        if let Some(commit) = &self.commit {
            builder = builder.commit(commit);
        }
        if let Some(scheduler) = &self.scheduler_id {
            builder = builder.scheduler_id(scheduler);
        }
        if let Some(date) = &self.date {
            builder = builder.date(date);
        }

        Ok(builder.build(Utc::now().date_naive())?)
    }

    /// Parameters for commands that never reach the queue; missing
    /// identity fields get placeholders.
    pub fn offline_context(&self) -> anyhow::Result<RunContext> {
        let mut args = self.clone();
        args.task_id.get_or_insert_with(|| "decision".to_string());
        args.repository
            .get_or_insert_with(|| "https://github.com/example/fenix".to_string());
        args.branch.get_or_insert_with(|| "main".to_string());
        args.commit.get_or_insert_with(|| "0000000000000000".to_string());
        args.context()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use liftoff_core::ContextError;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        run: RunArgs,
    }

    fn parse(args: &[&str]) -> RunArgs {
        let mut argv = vec!["liftoff"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).unwrap().run
    }

    #[test]
    fn test_context_from_flags() {
        let run = parse(&[
            "--task-id",
            "decision0000000000000",
            "--repository",
            "https://github.com/example/fenix",
            "--branch",
            "main",
            "--commit",
            "abcdef",
            "--date",
            "2019-03-07",
            "--trust-level",
            "3",
            "--staging",
            "--priority",
            "very-high",
        ]);
        let context = run.context().unwrap();
        assert_eq!(context.task_group_id(), "decision0000000000000");
        assert_eq!(context.trust_level(), 3);
        assert!(context.is_staging());
        assert_eq!(context.priority(), Priority::VeryHigh);
        assert_eq!(context.date().to_string(), "2019-03-07");
    }

    #[test]
    fn test_invalid_trust_level_is_rejected() {
        let run = parse(&[
            "--task-id",
            "t",
            "--repository",
            "r",
            "--branch",
            "b",
            "--commit",
            "c",
            "--trust-level",
            "7",
        ]);
        let err = run.context().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContextError>(),
            Some(ContextError::InvalidTrustLevel(7))
        ));
    }

    #[test]
    fn test_staging_accepts_boolish_environment() {
        let required = [
            "--task-id",
            "t",
            "--repository",
            "r",
            "--branch",
            "b",
            "--commit",
            "c",
        ];

        std::env::set_var("STAGING", "1");
        let staging = parse(&required);
        std::env::set_var("STAGING", "0");
        let production = parse(&required);
        std::env::remove_var("STAGING");

        assert!(staging.staging);
        assert!(staging.context().unwrap().is_staging());
        assert!(!production.staging);
    }

    #[test]
    fn test_offline_context_fills_placeholders() {
        let mut run = parse(&["--commit", "feedface"]);
        run.task_id = None;
        run.repository = None;
        run.branch = None;
        let context = run.offline_context().unwrap();
        assert_eq!(context.task_group_id(), "decision");
        assert_eq!(context.commit(), "feedface");
    }
}
