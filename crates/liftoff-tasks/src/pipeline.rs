//! Pipeline assembly
//!
//! Wires the release pipeline into a [`TaskGraph`]:
//!
//! ```text
//! release build ──┬── unit tests ──┐
//!                 └── lint ────────┴── signing ──── publish
//!                                  └── perf signing ── perf tests (+ harness)
//! ```
//!
//! Extra variant builds hang off the anchor only. Ids are issued before they
//! are referenced, so the graph is acyclic by construction.

use std::collections::BTreeMap;

use liftoff_core::{Architecture, Variant};
use tracing::{debug, instrument};

use crate::builder::{
    apk_artifact_name, PerformanceDevice, PerformanceTestTask, PublishTask, ReleaseBuildTask,
    SigningIndex, SigningTask, TaskBuilder, VariantTask,
};
use crate::error::{Result, TaskError};
use crate::graph::TaskGraph;
use crate::harness::HarnessTask;
use crate::ids::IdGenerator;
use crate::task::TaskDefinition;

/// Assembles the release pipeline for one run
pub struct PipelineAssembler<'a> {
    builder: &'a TaskBuilder,
    ids: &'a dyn IdGenerator,
}

impl<'a> PipelineAssembler<'a> {
    pub fn new(builder: &'a TaskBuilder, ids: &'a dyn IdGenerator) -> Self {
        Self { builder, ids }
    }

    /// Whether the configured pipeline needs the harness task
    pub fn needs_harness(&self) -> bool {
        !self.builder.config().pipeline.performance_tests.is_empty()
    }

    /// Build the task graph. `harness` is required when performance tests
    /// are configured.
    #[instrument(skip_all, fields(project = %self.builder.config().project.name))]
    pub fn assemble(&self, harness: Option<&HarnessTask>) -> Result<TaskGraph> {
        let config = self.builder.config();
        let pipeline = &config.pipeline;
        let mut tasks: Vec<(String, TaskDefinition)> = Vec::new();
        let mut external = vec![self.builder.context().task_group_id().to_string()];

        let release = ReleaseBuildTask::from_pipeline(pipeline);
        let build_id = self.ids.next_id();
        tasks.push((build_id.clone(), self.builder.release_build(&release)?));

        for variant in &pipeline.extra_variants {
            tasks.push((
                self.ids.next_id(),
                self.builder.variant_build(&VariantTask::new(variant))?,
            ));
        }

        let check = VariantTask::new(&pipeline.check_variant).depends_on(&build_id);
        let test_id = self.ids.next_id();
        tasks.push((test_id.clone(), self.builder.variant_test(&check)?));
        let lint_id = self.ids.next_id();
        tasks.push((lint_id.clone(), self.builder.variant_lint(&check)?));

        let gates = vec![test_id, lint_id];
        let apks: Vec<String> = self.builder.release_artifacts(&release).into_keys().collect();

        let signing_id = self.ids.next_id();
        tasks.push((
            signing_id.clone(),
            self.builder.signing(&SigningTask {
                build_task_id: build_id.clone(),
                apks: apks.clone(),
                dependencies: gates.clone(),
                index: SigningIndex::Nightly,
            }),
        ));

        if config.publish.enabled {
            tasks.push((
                self.ids.next_id(),
                self.builder.publish(&PublishTask {
                    signing_task_id: signing_id,
                    apks,
                    track: config.publish.track.clone(),
                    commit: config.publish.commit,
                }),
            ));
        }

        if self.needs_harness() {
            let harness = harness.ok_or(TaskError::HarnessRequired)?;
            external.push(harness.task_id.clone());

            let mut perf_signing: BTreeMap<Architecture, String> = BTreeMap::new();
            for test in &pipeline.performance_tests {
                let variant = Variant::from_parts(test.architecture, &pipeline.build_type);
                PerformanceDevice::select(&variant, test.force_64bit)?;

                let signing_id = match perf_signing.get(&test.architecture) {
                    Some(id) => id.clone(),
                    None => {
                        let id = self.ids.next_id();
                        tasks.push((
                            id.clone(),
                            self.builder.signing(&SigningTask {
                                build_task_id: build_id.clone(),
                                apks: vec![apk_artifact_name(&variant)],
                                dependencies: gates.clone(),
                                index: SigningIndex::PerformanceTest(test.architecture),
                            }),
                        ));
                        perf_signing.insert(test.architecture, id.clone());
                        id
                    }
                };

                tasks.push((
                    self.ids.next_id(),
                    self.builder.performance_test(&PerformanceTestTask {
                        signing_task_id: signing_id,
                        harness_task_id: harness.task_id.clone(),
                        harness_revision: harness.revision.clone(),
                        variant: variant.name.clone(),
                        test: test.test.clone(),
                        symbol: test.symbol.clone(),
                        force_64bit: test.force_64bit,
                        extra_options: test.extra_options.clone(),
                        ..PerformanceTestTask::default()
                    })?,
                ));
            }
        }

        debug!(task_count = tasks.len(), "pipeline tasks built");
        Ok(TaskGraph::from_tasks(tasks, external)?)
    }
}
