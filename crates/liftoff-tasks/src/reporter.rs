//! Submission reporting

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

/// Events emitted while a graph is submitted
#[derive(Debug, Clone)]
pub enum SubmitEvent {
    /// A group is about to be submitted
    GroupStarted { group: usize, task_count: usize },
    /// A task definition is about to be sent
    Submitting { id: String, definition: Value },
    /// The queue acknowledged a task
    Created { id: String, response: Value },
    /// The canonical definition was read back
    Confirmed { id: String },
    /// Submission of a task failed; the run stops
    Failed { id: String, error: String },
    /// Every task was created and confirmed
    Completed { total: usize, duration: Duration },
}

/// Trait for reporting submission progress
pub trait SubmitReporter: Send + Sync {
    fn report(&self, event: &SubmitEvent);
}

/// Logs every event through tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl SubmitReporter for TracingReporter {
    fn report(&self, event: &SubmitEvent) {
        match event {
            SubmitEvent::GroupStarted { group, task_count } => {
                tracing::info!("Submitting group {} ({} tasks)", group, task_count);
            }
            SubmitEvent::Submitting { id, definition } => {
                let rendered = serde_json::to_string_pretty(definition).unwrap_or_default();
                tracing::debug!(task_id = %id, "Task definition:\n{}", rendered);
            }
            SubmitEvent::Created { id, response } => {
                tracing::info!(task_id = %id, "Queue response: {}", response);
            }
            SubmitEvent::Confirmed { id } => {
                tracing::debug!(task_id = %id, "canonical definition fetched");
            }
            SubmitEvent::Failed { id, error } => {
                tracing::error!(task_id = %id, "Submission failed: {}", error);
            }
            SubmitEvent::Completed { total, duration } => {
                tracing::info!(
                    "Submitted {} tasks in {:.1}s",
                    total,
                    duration.as_secs_f64()
                );
            }
        }
    }
}

/// Reporter that keeps events for later inspection
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<SubmitEvent>>,
}

impl CollectingReporter {
    pub fn events(&self) -> Vec<SubmitEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl SubmitReporter for CollectingReporter {
    fn report(&self, event: &SubmitEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Fans events out to several reporters
pub struct ReporterRegistry {
    reporters: Vec<Arc<dyn SubmitReporter>>,
}

impl ReporterRegistry {
    /// Registry with a [`TracingReporter`]
    pub fn new() -> Self {
        Self {
            reporters: vec![Arc::new(TracingReporter)],
        }
    }

    pub fn register(&mut self, reporter: Arc<dyn SubmitReporter>) {
        self.reporters.push(reporter);
    }
}

impl Default for ReporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitReporter for ReporterRegistry {
    fn report(&self, event: &SubmitEvent) {
        for reporter in &self.reporters {
            reporter.report(event);
        }
    }
}
