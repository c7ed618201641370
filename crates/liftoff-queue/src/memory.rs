//! In-memory queue
//!
//! Behaves like the remote queue closely enough for dry runs and tests:
//! it refuses tasks whose dependencies it has not seen, back-fills the
//! fields the real service adds, and records every call in order.

use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{QueueError, Result};
use crate::traits::QueueService;
use crate::types::{IndexedTask, QueueCall};

#[derive(Debug, Default)]
struct State {
    tasks: BTreeMap<String, Value>,
    index: BTreeMap<String, String>,
    calls: Vec<QueueCall>,
}

/// Queue kept entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    state: Mutex<State>,
    reject: HashSet<String>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task that already exists, such as the decision task
    pub fn with_existing_task(mut self, task_id: impl Into<String>, definition: Value) -> Self {
        self.state.get_mut().tasks.insert(task_id.into(), definition);
        self
    }

    /// Index an existing task under a namespace
    pub fn with_indexed_task(
        mut self,
        namespace: impl Into<String>,
        task_id: impl Into<String>,
        definition: Value,
    ) -> Self {
        let task_id = task_id.into();
        let state = self.state.get_mut();
        state.index.insert(namespace.into(), task_id.clone());
        state.tasks.insert(task_id, definition);
        self
    }

    /// Refuse creation of the given task id
    pub fn rejecting(mut self, task_id: impl Into<String>) -> Self {
        self.reject.insert(task_id.into());
        self
    }

    /// Calls made so far, in order
    pub async fn calls(&self) -> Vec<QueueCall> {
        self.state.lock().await.calls.clone()
    }

    /// Ids of every stored task
    pub async fn task_ids(&self) -> Vec<String> {
        self.state.lock().await.tasks.keys().cloned().collect()
    }
}

/// Add the fields the queue fills in server-side
fn canonicalize(definition: &Value) -> Value {
    let mut canonical = definition.clone();
    if let Some(fields) = canonical.as_object_mut() {
        fields.entry("tags").or_insert_with(|| json!({}));
        fields.entry("extra").or_insert_with(|| json!({}));
        fields.entry("routes").or_insert_with(|| json!([]));
        fields.entry("scopes").or_insert_with(|| json!([]));
        fields
            .entry("requires")
            .or_insert_with(|| json!("all-completed"));

        let queue_id = match (
            fields.get("provisionerId").and_then(Value::as_str),
            fields.get("workerType").and_then(Value::as_str),
        ) {
            (Some(provisioner), Some(worker)) => Some(format!("{}/{}", provisioner, worker)),
            _ => None,
        };
        if let Some(queue_id) = queue_id {
            fields.entry("taskQueueId").or_insert_with(|| json!(queue_id));
        }
    }
    canonical
}

#[async_trait::async_trait]
impl QueueService for InMemoryQueue {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn create_task(&self, task_id: &str, definition: &Value) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.calls.push(QueueCall::Create(task_id.to_string()));

        if self.reject.contains(task_id) {
            return Err(QueueError::Rejected {
                task_id: task_id.to_string(),
                reason: "rejected by in-memory queue".to_string(),
            });
        }

        if !definition.is_object() {
            return Err(QueueError::InvalidDefinition(task_id.to_string()));
        }

        let dependencies = definition
            .get("dependencies")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for dependency in dependencies.iter().filter_map(Value::as_str) {
            if !state.tasks.contains_key(dependency) {
                return Err(QueueError::MissingDependency {
                    task_id: task_id.to_string(),
                    dependency: dependency.to_string(),
                });
            }
        }

        let canonical = canonicalize(definition);
        match state.tasks.get(task_id).cloned() {
            Some(existing) if existing != canonical => {
                return Err(QueueError::Conflict(task_id.to_string()));
            }
            Some(_) => debug!(task_id, "task already exists with the same definition"),
            None => {
                state.tasks.insert(task_id.to_string(), canonical);
            }
        }

        Ok(json!({
            "status": {
                "taskId": task_id,
                "taskGroupId": definition.get("taskGroupId").cloned().unwrap_or(Value::Null),
                "state": "unscheduled",
                "runs": [],
            }
        }))
    }

    async fn task(&self, task_id: &str) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.calls.push(QueueCall::Get(task_id.to_string()));
        state
            .tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| QueueError::TaskNotFound(task_id.to_string()))
    }

    async fn find_task(&self, index_path: &str) -> Result<IndexedTask> {
        let mut state = self.state.lock().await;
        state.calls.push(QueueCall::Find(index_path.to_string()));
        state
            .index
            .get(index_path)
            .map(|task_id| IndexedTask {
                namespace: index_path.to_string(),
                task_id: task_id.clone(),
            })
            .ok_or_else(|| QueueError::IndexNotFound(index_path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(deps: &[&str]) -> Value {
        json!({
            "provisionerId": "aws-provisioner-v1",
            "workerType": "mobile-1-b-fenix",
            "taskGroupId": "anchor",
            "dependencies": deps,
        })
    }

    #[tokio::test]
    async fn test_create_then_get_returns_canonical() {
        let queue = InMemoryQueue::new().with_existing_task("anchor", json!({}));

        let ack = queue.create_task("A", &definition(&["anchor"])).await.unwrap();
        assert_eq!(ack["status"]["taskId"], "A");

        let canonical = queue.task("A").await.unwrap();
        assert_eq!(canonical["taskQueueId"], "aws-provisioner-v1/mobile-1-b-fenix");
        assert_eq!(canonical["tags"], json!({}));
        assert_eq!(canonical["requires"], "all-completed");
    }

    #[tokio::test]
    async fn test_unknown_dependency_rejected() {
        let queue = InMemoryQueue::new();
        let err = queue
            .create_task("B", &definition(&["A"]))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::MissingDependency { .. }));
    }

    #[tokio::test]
    async fn test_create_is_idempotent_for_same_definition() {
        let queue = InMemoryQueue::new().with_existing_task("anchor", json!({}));
        queue.create_task("A", &definition(&["anchor"])).await.unwrap();
        queue.create_task("A", &definition(&["anchor"])).await.unwrap();

        let mut other = definition(&["anchor"]);
        other["workerType"] = json!("mobile-3-b-fenix");
        let err = queue.create_task("A", &other).await.unwrap_err();
        assert!(matches!(err, QueueError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let queue = InMemoryQueue::new()
            .with_existing_task("anchor", json!({}))
            .with_indexed_task("gecko.latest", "harness", json!({}));

        queue.find_task("gecko.latest").await.unwrap();
        queue.create_task("A", &definition(&["anchor"])).await.unwrap();
        queue.task("A").await.unwrap();

        assert_eq!(
            queue.calls().await,
            vec![
                QueueCall::Find("gecko.latest".to_string()),
                QueueCall::Create("A".to_string()),
                QueueCall::Get("A".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_rejecting_task() {
        let queue = InMemoryQueue::new()
            .with_existing_task("anchor", json!({}))
            .rejecting("A");
        let err = queue
            .create_task("A", &definition(&["anchor"]))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Rejected { .. }));
        assert!(!queue.task_ids().await.contains(&"A".to_string()));
    }

    #[tokio::test]
    async fn test_missing_index_path() {
        let queue = InMemoryQueue::new();
        let err = queue.find_task("nowhere").await.unwrap_err();
        assert!(matches!(err, QueueError::IndexNotFound(_)));
    }
}
