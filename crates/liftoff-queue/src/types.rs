//! Common queue types

use serde::{Deserialize, Serialize};

/// A task resolved through the index service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedTask {
    /// Index namespace the task was found under
    pub namespace: String,

    /// Indexed task id
    pub task_id: String,
}

/// A call made against a queue, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueCall {
    Create(String),
    Get(String),
    Find(String),
}
