//! Test-harness lookup for performance tests

use liftoff_queue::QueueService;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::{Result, TaskError};

/// External task providing the performance-test harness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessTask {
    pub task_id: String,
    /// Revision of the harness repository the task was built from
    pub revision: String,
}

/// Environment variable of the harness task carrying its revision
pub const HARNESS_REVISION_ENV: &str = "GECKO_HEAD_REV";

/// Find the latest harness task through the index and read its revision
#[instrument(skip(queue))]
pub async fn resolve_harness(queue: &dyn QueueService, index_path: &str) -> Result<HarnessTask> {
    let indexed = queue.find_task(index_path).await?;
    let definition = queue.task(&indexed.task_id).await?;

    let revision = definition
        .pointer(&format!("/payload/env/{}", HARNESS_REVISION_ENV))
        .and_then(Value::as_str)
        .filter(|rev| !rev.is_empty())
        .ok_or_else(|| TaskError::HarnessRevisionMissing(indexed.task_id.clone()))?;

    info!(task_id = %indexed.task_id, revision, "resolved harness task");
    Ok(HarnessTask {
        task_id: indexed.task_id,
        revision: revision.to_string(),
    })
}
