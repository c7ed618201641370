//! Queue service trait

use serde_json::Value;

use crate::error::Result;
use crate::types::IndexedTask;

/// Remote build-orchestration queue.
///
/// Definitions cross this boundary as opaque JSON: the queue back-fills
/// fields server-side, and callers that need the canonical form read it
/// back with [`QueueService::task`].
#[async_trait::async_trait]
pub trait QueueService: Send + Sync {
    /// Service name for logging
    fn name(&self) -> &str;

    /// Create a task under a caller-chosen id. Returns the queue's acknowledgement.
    async fn create_task(&self, task_id: &str, definition: &Value) -> Result<Value>;

    /// Fetch the canonical stored definition of a task
    async fn task(&self, task_id: &str) -> Result<Value>;

    /// Resolve an index path to the task indexed there
    async fn find_task(&self, index_path: &str) -> Result<IndexedTask>;
}
