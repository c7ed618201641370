//! Immutable run context
//!
//! Everything a decision task learns from its environment (repository,
//! revision, task-group anchor, scheduler, date, staging flag, trust level)
//! is frozen into a [`RunContext`] once, then handed to the task builder and
//! pipeline assembler.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ContextError;

/// Scheduler used when none is supplied
pub const DEFAULT_SCHEDULER_ID: &str = "taskcluster-github";

/// Task priority levels understood by the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Highest,
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
    #[default]
    Lowest,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Highest => "highest",
            Priority::VeryHigh => "very-high",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::VeryLow => "very-low",
            Priority::Lowest => "lowest",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highest" => Ok(Priority::Highest),
            "very-high" => Ok(Priority::VeryHigh),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            "very-low" => Ok(Priority::VeryLow),
            "lowest" => Ok(Priority::Lowest),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// Frozen parameters of one decision-task run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunContext {
    task_group_id: String,
    repo_url: String,
    branch: String,
    commit: String,
    scheduler_id: String,
    date: NaiveDate,
    staging: bool,
    trust_level: u8,
    priority: Priority,
}

impl RunContext {
    /// Start building a context
    pub fn builder() -> RunContextBuilder {
        RunContextBuilder::default()
    }

    /// Task group shared by every task of the run; also its anchor dependency
    pub fn task_group_id(&self) -> &str {
        &self.task_group_id
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn commit(&self) -> &str {
        &self.commit
    }

    pub fn scheduler_id(&self) -> &str {
        &self.scheduler_id
    }

    /// Release date encoded into index routes
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Whether this is a staging (dry) run against dep workers
    pub fn is_staging(&self) -> bool {
        self.staging
    }

    pub fn trust_level(&self) -> u8 {
        self.trust_level
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Whether the run builds the given canonical repository rather than a fork
    pub fn is_canonical_repository(&self, canonical: &str) -> bool {
        normalize_repo_url(&self.repo_url) == normalize_repo_url(canonical)
    }
}

fn normalize_repo_url(url: &str) -> &str {
    let url = url.trim_end_matches('/');
    url.strip_suffix(".git").unwrap_or(url)
}

/// Builder for [`RunContext`]
#[derive(Debug, Clone, Default)]
pub struct RunContextBuilder {
    task_group_id: Option<String>,
    repo_url: Option<String>,
    branch: Option<String>,
    commit: Option<String>,
    scheduler_id: Option<String>,
    date: Option<String>,
    staging: bool,
    trust_level: Option<u8>,
    priority: Priority,
}

impl RunContextBuilder {
    pub fn task_group_id(mut self, id: impl Into<String>) -> Self {
        self.task_group_id = Some(id.into());
        self
    }

    pub fn repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = Some(url.into());
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn scheduler_id(mut self, id: impl Into<String>) -> Self {
        self.scheduler_id = Some(id.into());
        self
    }

    /// Date as RFC 3339 or `YYYY-MM-DD`
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn staging(mut self, staging: bool) -> Self {
        self.staging = staging;
        self
    }

    pub fn trust_level(mut self, level: u8) -> Self {
        self.trust_level = Some(level);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Validate and freeze the context. A missing date defaults to `today`.
    pub fn build(self, today: NaiveDate) -> Result<RunContext, ContextError> {
        let trust_level = self.trust_level.unwrap_or(1);
        if !(1..=3).contains(&trust_level) {
            return Err(ContextError::InvalidTrustLevel(trust_level));
        }

        let date = match self.date.as_deref() {
            Some(raw) => parse_date(raw)?,
            None => today,
        };

        Ok(RunContext {
            task_group_id: required(self.task_group_id, "task group id")?,
            repo_url: required(self.repo_url, "repository url")?,
            branch: required(self.branch, "branch")?,
            commit: required(self.commit, "commit")?,
            scheduler_id: self
                .scheduler_id
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SCHEDULER_ID.to_string()),
            date,
            staging: self.staging,
            trust_level,
            priority: self.priority,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ContextError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ContextError::MissingParameter(name))
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Result<NaiveDate, ContextError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc).date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ContextError::InvalidDate(raw.to_string()))
}
