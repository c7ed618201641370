//! Liftoff Tasks - task graph engine
//!
//! This crate builds queue task definitions, assembles them into ordered
//! groups, submits the groups to a queue and persists the resulting
//! chain-of-trust snapshot.

pub mod builder;
pub mod chain_of_trust;
pub mod error;
pub mod graph;
pub mod harness;
pub mod ids;
pub mod pipeline;
pub mod reporter;
pub mod submitter;
pub mod task;

pub use builder::{
    PerformanceTestTask, PublishTask, ReleaseBuildTask, SigningIndex, SigningTask, TaskBuilder,
    VariantTask,
};
pub use chain_of_trust::{load_task_graph, persist, GraphSnapshot};
pub use error::{GraphError, Result, TaskError};
pub use graph::{TaskGraph, TaskGroup};
pub use harness::{resolve_harness, HarnessTask};
pub use ids::{slug_id, IdGenerator, SequentialIds, SlugIds};
pub use pipeline::PipelineAssembler;
pub use reporter::{
    CollectingReporter, ReporterRegistry, SubmitEvent, SubmitReporter, TracingReporter,
};
pub use submitter::GraphSubmitter;
pub use task::{Payload, TaskDefinition};
