//! Task definition builder
//!
//! Pure construction of task definitions from a frozen [`RunContext`] and
//! project [`Config`]. Nothing here talks to the queue. Every public
//! operation funnels through [`TaskBuilder::finalize`], which fills the
//! fields all tasks share.

mod build;
mod perf;
mod release;

use std::collections::BTreeMap;
use std::sync::Arc;

use liftoff_core::clock::{default_deadline, default_expiry};
use liftoff_core::{Clock, Config, Priority, RunContext, SystemClock};

use crate::task::{
    Artifact, DockerPayload, Extra, Features, Payload, Requires, TaskDefinition, TaskMetadata,
    Treeherder, SECRET_SCOPE_PREFIX,
};

pub use build::{apk_artifact_name, ReleaseBuildTask, VariantTask};
pub use perf::{PerformanceDevice, PerformanceTestTask};
pub use release::{PublishTask, SigningIndex, SigningTask};

/// Retries requested from the worker for every task
pub const DEFAULT_RETRIES: u32 = 5;

/// Task-specific inputs to [`TaskBuilder::finalize`]
#[derive(Debug, Clone)]
pub struct TaskTemplate {
    pub name: String,
    pub description: String,
    pub provisioner_id: String,
    pub worker_type: String,
    pub payload: Payload,
    pub dependencies: Vec<String>,
    pub routes: Vec<String>,
    pub scopes: Vec<String>,
    pub priority: Option<Priority>,
    pub treeherder: Option<Treeherder>,
}

impl TaskTemplate {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        provisioner_id: impl Into<String>,
        worker_type: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            provisioner_id: provisioner_id.into(),
            worker_type: worker_type.into(),
            payload,
            dependencies: Vec::new(),
            routes: Vec::new(),
            scopes: Vec::new(),
            priority: None,
            treeherder: None,
        }
    }

    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = String>) -> Self {
        self.dependencies.extend(dependencies);
        self
    }

    pub fn with_routes(mut self, routes: impl IntoIterator<Item = String>) -> Self {
        self.routes.extend(routes);
        self
    }

    pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = String>) -> Self {
        self.scopes.extend(scopes);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_treeherder(mut self, treeherder: Treeherder) -> Self {
        self.treeherder = Some(treeherder);
        self
    }
}

/// Builds task definitions for one run
#[derive(Clone)]
pub struct TaskBuilder {
    context: RunContext,
    config: Config,
    clock: Arc<dyn Clock>,
}

impl TaskBuilder {
    /// Create a builder using the wall clock
    pub fn new(context: RunContext, config: Config) -> Self {
        Self {
            context,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock timestamps are computed from
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn project(&self) -> &str {
        &self.config.project.name
    }

    /// Fill the cross-cutting fields of a task.
    ///
    /// The anchor task id always comes first in `dependencies`. Feature flags
    /// are derived from the payload's artifacts and the secret scopes and
    /// replace whatever the template carried.
    pub fn finalize(&self, template: TaskTemplate) -> TaskDefinition {
        let now = self.clock.now();
        let anchor = self.context.task_group_id().to_string();

        let mut dependencies = vec![anchor.clone()];
        for dependency in template.dependencies {
            if !dependencies.contains(&dependency) {
                dependencies.push(dependency);
            }
        }

        let mut routes = template.routes;
        routes.push(format!(
            "tc-treeherder.v2.{}.{}",
            self.project(),
            self.context.commit()
        ));

        let features = Features {
            chain_of_trust: template.payload.declared_artifacts() > 0,
            taskcluster_proxy: template
                .scopes
                .iter()
                .any(|scope| scope.starts_with(SECRET_SCOPE_PREFIX)),
        };
        let mut payload = template.payload;
        payload.set_features(features);

        TaskDefinition {
            provisioner_id: template.provisioner_id,
            worker_type: template.worker_type,
            task_group_id: anchor,
            scheduler_id: self.context.scheduler_id().to_string(),
            created: now,
            deadline: self.clock.from_now(default_deadline()),
            expires: self.clock.from_now(default_expiry()),
            retries: DEFAULT_RETRIES,
            tags: BTreeMap::new(),
            priority: template.priority.unwrap_or(self.context.priority()),
            dependencies,
            requires: Requires::AllCompleted,
            routes,
            scopes: template.scopes,
            payload,
            metadata: TaskMetadata {
                name: template.name,
                description: template.description,
                owner: self.config.project.owner.clone(),
                source: self.config.project.source.clone(),
            },
            extra: Extra {
                treeherder: template.treeherder,
            },
        }
    }

    /// Fetch the pushed revision into the worker's checkout
    fn checkout_command(&self) -> String {
        format!(
            "export TERM=dumb && git fetch {} {} --tags && git config advice.detachedHead false && git checkout {}",
            self.context.repo_url(),
            self.context.branch(),
            self.context.commit()
        )
    }

    /// Docker payload running `steps` joined with `&&` after the checkout
    fn docker_payload(&self, steps: &[String], artifacts: BTreeMap<String, Artifact>) -> Payload {
        let mut command = self.checkout_command();
        for step in steps {
            command.push_str(" && ");
            command.push_str(step);
        }

        Payload::Docker(DockerPayload {
            features: Features::default(),
            max_run_time: self.config.project.max_run_time,
            image: self.config.project.image.clone(),
            command: vec![
                "/bin/bash".to_string(),
                "--login".to_string(),
                "-cx".to_string(),
                command,
            ],
            artifacts,
        })
    }

    /// Worker pool for docker builds at the run's trust level
    fn build_worker_type(&self) -> String {
        format!("mobile-{}-b-{}", self.context.trust_level(), self.project())
    }
}

fn notify_on_failure(address: &str) -> String {
    format!("notify.email.{}.on-failed", address)
}
