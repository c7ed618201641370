//! Graph submission
//!
//! Groups are submitted strictly in order, one task at a time. Each task is
//! created and then read back so the snapshot holds the queue's canonical
//! form. The first failure aborts the run.

use std::sync::Arc;
use std::time::Instant;

use liftoff_queue::QueueService;
use tracing::instrument;

use crate::chain_of_trust::GraphSnapshot;
use crate::error::{Result, TaskError};
use crate::graph::TaskGraph;
use crate::reporter::{SubmitEvent, SubmitReporter};

/// Submits task graphs to a queue
pub struct GraphSubmitter {
    queue: Arc<dyn QueueService>,
    reporter: Arc<dyn SubmitReporter>,
}

impl GraphSubmitter {
    pub fn new(queue: Arc<dyn QueueService>, reporter: Arc<dyn SubmitReporter>) -> Self {
        Self { queue, reporter }
    }

    /// Create every task of the graph and collect the canonical definitions
    #[instrument(skip_all, fields(queue = self.queue.name(), groups = graph.groups().len(), tasks = graph.len()))]
    pub async fn submit(&self, graph: &TaskGraph) -> Result<GraphSnapshot> {
        graph.validate()?;

        let start = Instant::now();
        let mut snapshot = GraphSnapshot::new();

        for (index, group) in graph.groups().iter().enumerate() {
            self.reporter.report(&SubmitEvent::GroupStarted {
                group: index,
                task_count: group.len(),
            });

            for (task_id, definition) in group {
                let body = serde_json::to_value(definition)?;
                self.reporter.report(&SubmitEvent::Submitting {
                    id: task_id.clone(),
                    definition: body.clone(),
                });

                let response = self
                    .queue
                    .create_task(task_id, &body)
                    .await
                    .map_err(|source| self.failed(task_id, source))?;
                self.reporter.report(&SubmitEvent::Created {
                    id: task_id.clone(),
                    response,
                });

                let canonical = self
                    .queue
                    .task(task_id)
                    .await
                    .map_err(|source| self.failed(task_id, source))?;
                self.reporter.report(&SubmitEvent::Confirmed {
                    id: task_id.clone(),
                });

                snapshot.insert(task_id.clone(), canonical);
            }
        }

        self.reporter.report(&SubmitEvent::Completed {
            total: snapshot.len(),
            duration: start.elapsed(),
        });

        Ok(snapshot)
    }

    fn failed(&self, task_id: &str, source: liftoff_queue::QueueError) -> TaskError {
        self.reporter.report(&SubmitEvent::Failed {
            id: task_id.to_string(),
            error: source.to_string(),
        });
        TaskError::QueueSubmission {
            task_id: task_id.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tests::ANCHOR;
    use crate::graph::tests::task;
    use crate::graph::TaskGroup;
    use crate::reporter::CollectingReporter;
    use liftoff_queue::{InMemoryQueue, QueueCall, QueueError};
    use serde_json::json;

    fn two_group_graph() -> TaskGraph {
        TaskGraph::from_groups(
            vec![
                TaskGroup::from([("A".to_string(), task(&[]))]),
                TaskGroup::from([("B".to_string(), task(&["A"]))]),
            ],
            [ANCHOR.to_string()],
        )
        .unwrap()
    }

    fn queue() -> InMemoryQueue {
        InMemoryQueue::new().with_existing_task(ANCHOR, json!({}))
    }

    #[tokio::test]
    async fn test_create_and_get_precede_next_group() {
        let queue = Arc::new(queue());
        let submitter = GraphSubmitter::new(queue.clone(), Arc::new(CollectingReporter::default()));

        submitter.submit(&two_group_graph()).await.unwrap();

        assert_eq!(
            queue.calls().await,
            vec![
                QueueCall::Create("A".to_string()),
                QueueCall::Get("A".to_string()),
                QueueCall::Create("B".to_string()),
                QueueCall::Get("B".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_group_barrier_on_wider_graph() {
        let graph = TaskGraph::from_tasks(
            vec![
                ("build".to_string(), task(&[])),
                ("variant".to_string(), task(&[])),
                ("test".to_string(), task(&["build"])),
                ("lint".to_string(), task(&["build"])),
                ("sign".to_string(), task(&["build", "test", "lint"])),
            ],
            [ANCHOR.to_string()],
        )
        .unwrap();

        let queue = Arc::new(queue());
        GraphSubmitter::new(queue.clone(), Arc::new(CollectingReporter::default()))
            .submit(&graph)
            .await
            .unwrap();

        let creates: Vec<String> = queue
            .calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                QueueCall::Create(id) => Some(id),
                _ => None,
            })
            .collect();
        let position = |id: &str| creates.iter().position(|c| c == id).unwrap();

        for first in ["build", "variant"] {
            for later in ["test", "lint", "sign"] {
                assert!(position(first) < position(later));
            }
        }
        assert!(position("test") < position("sign"));
        assert!(position("lint") < position("sign"));
    }

    #[tokio::test]
    async fn test_snapshot_holds_canonical_definitions() {
        let queue = Arc::new(queue());
        let snapshot = GraphSubmitter::new(queue, Arc::new(CollectingReporter::default()))
            .submit(&two_group_graph())
            .await
            .unwrap();

        assert_eq!(snapshot.len(), 2);
        let canonical = snapshot.get("B").unwrap();
        assert_eq!(canonical["taskQueueId"], "aws-provisioner-v1/mobile-3-b-fenix");
        assert_eq!(canonical["dependencies"], json!([ANCHOR, "A"]));
    }

    #[tokio::test]
    async fn test_failure_aborts_run() {
        let queue = Arc::new(queue().rejecting("A"));
        let reporter = Arc::new(CollectingReporter::default());
        let err = GraphSubmitter::new(queue.clone(), reporter.clone())
            .submit(&two_group_graph())
            .await
            .unwrap_err();

        match err {
            TaskError::QueueSubmission { task_id, source } => {
                assert_eq!(task_id, "A");
                assert!(matches!(source, QueueError::Rejected { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(queue.calls().await, vec![QueueCall::Create("A".to_string())]);
        assert!(reporter
            .events()
            .iter()
            .any(|e| matches!(e, SubmitEvent::Failed { id, .. } if id == "A")));
    }

    #[tokio::test]
    async fn test_reports_progress() {
        let reporter = Arc::new(CollectingReporter::default());
        GraphSubmitter::new(Arc::new(queue()), reporter.clone())
            .submit(&two_group_graph())
            .await
            .unwrap();

        let events = reporter.events();
        assert!(matches!(
            events.first(),
            Some(SubmitEvent::GroupStarted { group: 0, task_count: 1 })
        ));
        assert!(matches!(
            events.last(),
            Some(SubmitEvent::Completed { total: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_anchor_is_a_submission_error() {
        let queue = Arc::new(InMemoryQueue::new());
        let err = GraphSubmitter::new(queue, Arc::new(CollectingReporter::default()))
            .submit(&two_group_graph())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TaskError::QueueSubmission {
                source: QueueError::MissingDependency { .. },
                ..
            }
        ));
    }
}
