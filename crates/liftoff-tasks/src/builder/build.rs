//! Build, unit test and lint tasks

use std::collections::BTreeMap;

use liftoff_core::clock::default_expiry;
use liftoff_core::config::PipelineConfig;
use liftoff_core::variant::capitalize;
use liftoff_core::{Architecture, BuildKind, Variant, VariantError};
use tracing::debug;

use super::{notify_on_failure, TaskBuilder, TaskTemplate};
use crate::task::{Artifact, ArtifactKind, JobKind, TaskDefinition, Treeherder};

/// Multi-architecture release build
#[derive(Debug, Clone)]
pub struct ReleaseBuildTask {
    /// Architectures packaged by the build
    pub architectures: Vec<Architecture>,
    /// Build type shared by every architecture
    pub build_type: String,
    pub dependencies: Vec<String>,
}

impl Default for ReleaseBuildTask {
    fn default() -> Self {
        Self {
            architectures: Architecture::ALL.to_vec(),
            build_type: "nightly".to_string(),
            dependencies: Vec::new(),
        }
    }
}

impl ReleaseBuildTask {
    pub fn from_pipeline(pipeline: &PipelineConfig) -> Self {
        Self {
            architectures: pipeline.architectures.clone(),
            build_type: pipeline.build_type.clone(),
            dependencies: Vec::new(),
        }
    }

    /// One variant per architecture
    pub fn variants(&self) -> Vec<Variant> {
        self.architectures
            .iter()
            .map(|arch| Variant::from_parts(*arch, &self.build_type))
            .collect()
    }
}

/// A task for a single variant
#[derive(Debug, Clone, Default)]
pub struct VariantTask {
    /// Variant name, e.g. `x86Debug`
    pub variant: String,
    pub dependencies: Vec<String>,
}

impl VariantTask {
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn depends_on(mut self, task_id: impl Into<String>) -> Self {
        self.dependencies.push(task_id.into());
        self
    }
}

/// Public artifact name of a variant's APK
pub fn apk_artifact_name(variant: &Variant) -> String {
    format!(
        "public/app-{}-{}-unsigned.apk",
        variant.architecture, variant.build_type
    )
}

#[derive(Debug, Clone, Copy)]
enum VariantStep {
    Assemble,
    Test,
    Lint,
}

impl VariantStep {
    fn label(&self) -> &'static str {
        match self {
            VariantStep::Assemble => "assemble",
            VariantStep::Test => "test",
            VariantStep::Lint => "lint",
        }
    }

    fn gradle_tasks(&self, variant: &Variant) -> String {
        let name = variant.gradle_name();
        match self {
            VariantStep::Assemble => format!("assemble{}", name),
            VariantStep::Test => format!("test{}UnitTest", name),
            VariantStep::Lint => format!("detekt ktlint lint{}", name),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            VariantStep::Assemble => "B",
            VariantStep::Test => "T",
            VariantStep::Lint => "L",
        }
    }

    fn job_kind(&self) -> JobKind {
        match self {
            VariantStep::Assemble => JobKind::Build,
            VariantStep::Test | VariantStep::Lint => JobKind::Test,
        }
    }
}

fn gradle(tasks: &str) -> String {
    format!("./gradlew --no-daemon -PcrashReports=true clean {}", tasks)
}

impl TaskBuilder {
    /// Artifact name to in-container path for every APK of the release build
    pub fn release_artifacts(&self, task: &ReleaseBuildTask) -> BTreeMap<String, String> {
        task.variants()
            .iter()
            .map(|variant| {
                (
                    apk_artifact_name(variant),
                    variant.apk_path(&self.config.project.apk_root),
                )
            })
            .collect()
    }

    /// Steps that write each configured secret to its target file
    fn secret_steps(&self) -> (Vec<String>, Vec<String>) {
        let prefix = if self.context.is_staging() {
            "garbage/staging/"
        } else {
            ""
        };

        self.config
            .effective_secrets()
            .iter()
            .map(|secret| {
                let name = format!("{}{}", prefix, secret.name);
                let step = format!(
                    "python automation/taskcluster/helper/get-secret.py -s {} -k {} -f {}",
                    name, secret.key, secret.target
                );
                (step, format!("secrets:get:{}", name))
            })
            .unzip()
    }

    /// Build every architecture of one build type in a single task
    pub fn release_build(&self, task: &ReleaseBuildTask) -> Result<TaskDefinition, VariantError> {
        let kind = BuildKind::classify(&task.build_type).ok_or_else(|| {
            VariantError::UnsupportedBuildType {
                variant: task.build_type.clone(),
                build_type: task.build_type.clone(),
            }
        })?;

        let expires = self.clock.from_now(default_expiry());
        let artifacts = self
            .release_artifacts(task)
            .into_iter()
            .map(|(name, path)| {
                (
                    name,
                    Artifact {
                        kind: ArtifactKind::File,
                        path,
                        expires,
                    },
                )
            })
            .collect();

        let (mut steps, scopes) = self.secret_steps();
        steps.push(gradle(&format!(
            "test assemble{}",
            capitalize(&task.build_type)
        )));
        debug!(build_type = %task.build_type, steps = steps.len(), "release build command assembled");

        let mut routes = Vec::new();
        if !self.context.is_staging() {
            routes.push(notify_on_failure(&self.config.project.notify_email));
        }

        let template = TaskTemplate::new(
            format!("build: {}", task.build_type),
            format!(
                "Build {} {} for {}",
                self.project(),
                task.build_type,
                task.architectures
                    .iter()
                    .map(|a| a.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            self.config.project.build_provisioner.clone(),
            self.build_worker_type(),
            self.docker_payload(&steps, artifacts),
        )
        .with_dependencies(task.dependencies.iter().cloned())
        .with_routes(routes)
        .with_scopes(scopes)
        .with_treeherder(
            Treeherder::new("B", "android-all", JobKind::Build)
                .with_group(kind.group_symbol())
                .with_collection(kind.collection()),
        );

        Ok(self.finalize(template))
    }

    /// Assemble a single variant
    pub fn variant_build(&self, task: &VariantTask) -> Result<TaskDefinition, VariantError> {
        self.variant_task(task, VariantStep::Assemble)
    }

    /// Run the unit tests of a variant
    pub fn variant_test(&self, task: &VariantTask) -> Result<TaskDefinition, VariantError> {
        self.variant_task(task, VariantStep::Test)
    }

    /// Run static analysis and lint for a variant
    pub fn variant_lint(&self, task: &VariantTask) -> Result<TaskDefinition, VariantError> {
        self.variant_task(task, VariantStep::Lint)
    }

    fn variant_task(
        &self,
        task: &VariantTask,
        step: VariantStep,
    ) -> Result<TaskDefinition, VariantError> {
        let variant = Variant::decode(&task.variant)?;
        let kind = variant.kind()?;
        let gradle_tasks = step.gradle_tasks(&variant);

        let mut artifacts = BTreeMap::new();
        if let VariantStep::Assemble = step {
            artifacts.insert(
                apk_artifact_name(&variant),
                Artifact {
                    kind: ArtifactKind::File,
                    path: variant.apk_path(&self.config.project.apk_root),
                    expires: self.clock.from_now(default_expiry()),
                },
            );
        }

        let template = TaskTemplate::new(
            format!("{}: {}", step.label(), variant.label()),
            format!("Run {} for {}", gradle_tasks, variant),
            self.config.project.build_provisioner.clone(),
            self.build_worker_type(),
            self.docker_payload(&[gradle(&gradle_tasks)], artifacts),
        )
        .with_dependencies(task.dependencies.iter().cloned())
        .with_treeherder(
            Treeherder::new(step.symbol(), variant.architecture.platform(), step.job_kind())
                .with_group(kind.group_symbol())
                .with_collection(kind.collection()),
        );

        Ok(self.finalize(template))
    }
}
