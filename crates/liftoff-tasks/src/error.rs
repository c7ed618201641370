//! Error types for task graph construction and submission

use liftoff_core::{LiftoffError, VariantError};
use liftoff_queue::QueueError;
use thiserror::Error;

/// Result type alias using TaskError
pub type Result<T> = std::result::Result<T, TaskError>;

/// Errors raised while building, submitting or persisting a task graph
#[derive(Debug, Error)]
pub enum TaskError {
    /// Variant could not be decoded or classified
    #[error(transparent)]
    Variant(#[from] VariantError),

    /// Graph shape violates submission ordering
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Queue lookup failed outside of submission
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Creating or reading back a task failed; the run is abandoned
    #[error("Queue submission failed for task {task_id}: {source}")]
    QueueSubmission {
        task_id: String,
        #[source]
        source: QueueError,
    },

    /// Performance tests are configured but no harness task was resolved
    #[error("Performance tests require a harness task")]
    HarnessRequired,

    /// Harness task does not carry the revision it was built from
    #[error("Harness task {0} does not declare a revision")]
    HarnessRevisionMissing(String),

    /// Core error
    #[error(transparent)]
    Core(#[from] LiftoffError),

    /// IO error while persisting the snapshot
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors in the shape of a task graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The same id appears more than once
    #[error("Duplicate task id {0}")]
    DuplicateTask(String),

    /// Dependency is neither a graph task nor a known external task
    #[error("Task {task_id} depends on unknown task {dependency}")]
    UnknownDependency { task_id: String, dependency: String },

    /// Dependency is not in a strictly earlier group
    #[error("Task {task_id} in group {group} depends on {dependency}, which is not in an earlier group")]
    GraphOrdering {
        task_id: String,
        group: usize,
        dependency: String,
    },

    /// Dependencies form a cycle
    #[error("Cyclic dependency detected among tasks: {0}")]
    CyclicDependency(String),
}
