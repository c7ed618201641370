//! Queue error types

use thiserror::Error;

/// Errors from the queue and index services
#[derive(Debug, Error)]
pub enum QueueError {
    /// API error from the queue
    #[error("Queue API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Task does not exist
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Index namespace does not resolve to a task
    #[error("No task indexed at {0}")]
    IndexNotFound(String),

    /// Task id already used by a different definition
    #[error("Task {0} already exists with a different definition")]
    Conflict(String),

    /// Task declares a dependency the queue does not know
    #[error("Task {task_id} depends on unknown task {dependency}")]
    MissingDependency { task_id: String, dependency: String },

    /// Definition is not a JSON object
    #[error("Invalid task definition for {0}: expected a JSON object")]
    InvalidDefinition(String),

    /// Submission refused by the queue
    #[error("Queue rejected task {task_id}: {reason}")]
    Rejected { task_id: String, reason: String },

    /// Invalid service URL
    #[error("Invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;
