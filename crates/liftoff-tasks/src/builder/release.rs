//! Signing and store-publishing tasks

use chrono::Datelike;
use liftoff_core::Architecture;

use super::{TaskBuilder, TaskTemplate};
use crate::task::{
    JobKind, Payload, PublishPayload, SigningPayload, TaskDefinition, Treeherder,
    UpstreamArtifacts,
};

const DEP_SIGNING_WORKER: &str = "mobile-signing-dep-v1";
const RELEASE_SIGNING_WORKER: &str = "mobile-signing-v1";
const DEP_PUSH_WORKER: &str = "mobile-pushapk-dep-v1";
const RELEASE_PUSH_WORKER: &str = "mobile-pushapk-v1";

/// Index routes a signing task publishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SigningIndex {
    /// No index routes
    #[default]
    None,
    /// Nightly namespace, always indexed
    Nightly,
    /// Performance-test namespace, indexed only for the canonical repository
    PerformanceTest(Architecture),
}

/// Signing of an upstream build's APKs
#[derive(Debug, Clone, Default)]
pub struct SigningTask {
    pub build_task_id: String,
    /// Artifact names of the upstream build to sign
    pub apks: Vec<String>,
    /// Tasks gating the signature besides the build
    pub dependencies: Vec<String>,
    pub index: SigningIndex,
}

/// Hand-off of signed APKs to the store
#[derive(Debug, Clone)]
pub struct PublishTask {
    pub signing_task_id: String,
    pub apks: Vec<String>,
    pub track: String,
    pub commit: bool,
}

impl Default for PublishTask {
    fn default() -> Self {
        Self {
            signing_task_id: String::new(),
            apks: Vec::new(),
            track: "nightly".to_string(),
            commit: false,
        }
    }
}

impl TaskBuilder {
    /// Index routes for a signing task. Forks of the canonical repository
    /// publish no index routes.
    pub fn signing_routes(&self, index: SigningIndex) -> Vec<String> {
        let project = self.project();
        let date = self.context.date();
        let (year, month, day) = (date.year(), date.month(), date.day());
        let commit = self.context.commit();

        if !self
            .context
            .is_canonical_repository(&self.config.project.canonical_repository)
        {
            return Vec::new();
        }

        match index {
            SigningIndex::None => Vec::new(),
            SigningIndex::Nightly => {
                let namespace = if self.context.is_staging() {
                    "staging-signed-nightly"
                } else {
                    "signed-nightly"
                };
                let base = format!("index.project.mobile.{}.{}.nightly", project, namespace);
                vec![
                    format!("{}.{}.{}.{}.latest", base, year, month, day),
                    format!("{}.{}.{}.{}.revision.{}", base, year, month, day, commit),
                    format!("{}.latest", base),
                ]
            }
            SigningIndex::PerformanceTest(arch) => {
                let base = format!("index.project.mobile.{}.v2.performance-test", project);
                vec![
                    format!("{}.{}.{}.{}.latest.{}", base, year, month, day, arch),
                    format!(
                        "{}.{}.{}.{}.revision.{}.{}",
                        base, year, month, day, commit, arch
                    ),
                    format!("{}.latest.{}", base, arch),
                ]
            }
        }
    }

    /// Sign the APKs of an upstream build
    pub fn signing(&self, task: &SigningTask) -> TaskDefinition {
        let project = self.project();
        let (worker_type, cert) = if self.context.is_staging() {
            (DEP_SIGNING_WORKER, "dep-signing")
        } else {
            (RELEASE_SIGNING_WORKER, "release-signing")
        };
        let format = &self.config.signing.format;

        let (name, group) = match task.index {
            SigningIndex::None => ("sign: release".to_string(), "release"),
            SigningIndex::Nightly => ("sign: nightly".to_string(), "nightly"),
            SigningIndex::PerformanceTest(arch) => {
                (format!("sign: performance-test ({})", arch), "performance")
            }
        };

        let payload = Payload::Signing(SigningPayload {
            upstream_artifacts: vec![UpstreamArtifacts {
                paths: task.apks.clone(),
                formats: vec![format.clone()],
                task_id: task.build_task_id.clone(),
                task_type: "build".to_string(),
            }],
            features: Default::default(),
        });

        let mut dependencies = vec![task.build_task_id.clone()];
        dependencies.extend(task.dependencies.iter().cloned());

        let template = TaskTemplate::new(
            name,
            format!("Sign {} APKs", project),
            self.config.project.scriptworker_provisioner.clone(),
            worker_type,
            payload,
        )
        .with_dependencies(dependencies)
        .with_routes(self.signing_routes(task.index))
        .with_scopes([
            format!("project:mobile:{}:releng:signing:format:{}", project, format),
            format!("project:mobile:{}:releng:signing:cert:{}", project, cert),
        ])
        .with_treeherder(
            Treeherder::new("Bs", "android-all", JobKind::Other).with_group(group),
        );

        self.finalize(template)
    }

    /// Push signed APKs to the store
    pub fn publish(&self, task: &PublishTask) -> TaskDefinition {
        let project = self.project();
        let (worker_type, suffix) = if self.context.is_staging() {
            (DEP_PUSH_WORKER, ":dep")
        } else {
            (RELEASE_PUSH_WORKER, "")
        };

        let payload = Payload::Publish(PublishPayload {
            commit: task.commit,
            track: task.track.clone(),
            upstream_artifacts: vec![UpstreamArtifacts {
                paths: task.apks.clone(),
                formats: Vec::new(),
                task_id: task.signing_task_id.clone(),
                task_type: "signing".to_string(),
            }],
            features: Default::default(),
        });

        let template = TaskTemplate::new(
            format!("publish: {}", task.track),
            format!("Publish {} to the {} track", project, task.track),
            self.config.project.scriptworker_provisioner.clone(),
            worker_type,
            payload,
        )
        .with_dependencies([task.signing_task_id.clone()])
        .with_scopes([format!(
            "project:mobile:{}:releng:googleplay:product:{}{}",
            project, project, suffix
        )])
        .with_treeherder(Treeherder::new("gp", "android-all", JobKind::Other));

        self.finalize(template)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{assert_shared_invariants, builder, context};
    use super::*;
    use liftoff_core::Config;

    fn signing_task(index: SigningIndex) -> SigningTask {
        SigningTask {
            build_task_id: "build".to_string(),
            apks: vec!["public/app-arm-nightly-unsigned.apk".to_string()],
            dependencies: vec!["test".to_string(), "lint".to_string()],
            index,
        }
    }

    #[test]
    fn test_staging_signing_uses_dep_pool_and_cert() {
        let task = builder(true).signing(&signing_task(SigningIndex::None));
        assert_shared_invariants(&task);
        assert_eq!(task.worker_type, "mobile-signing-dep-v1");
        assert_eq!(task.provisioner_id, "scriptworker-prov-v1");
        assert!(task
            .scopes
            .contains(&"project:mobile:fenix:releng:signing:cert:dep-signing".to_string()));
        assert!(task
            .scopes
            .contains(&"project:mobile:fenix:releng:signing:format:autograph_apk".to_string()));
    }

    #[test]
    fn test_release_signing_uses_release_pool_and_cert() {
        let task = builder(false).signing(&signing_task(SigningIndex::None));
        assert_eq!(task.worker_type, "mobile-signing-v1");
        assert!(task
            .scopes
            .contains(&"project:mobile:fenix:releng:signing:cert:release-signing".to_string()));
        assert!(task.features().is_empty());
    }

    #[test]
    fn test_signing_payload_and_dependencies() {
        let task = builder(false).signing(&signing_task(SigningIndex::None));
        assert_eq!(
            task.dependencies,
            vec![
                super::super::tests::ANCHOR.to_string(),
                "build".to_string(),
                "test".to_string(),
                "lint".to_string(),
            ]
        );

        let value = serde_json::to_value(&task.payload).unwrap();
        assert_eq!(value["upstreamArtifacts"][0]["taskId"], "build");
        assert_eq!(value["upstreamArtifacts"][0]["formats"][0], "autograph_apk");
        assert_eq!(
            value["upstreamArtifacts"][0]["paths"][0],
            "public/app-arm-nightly-unsigned.apk"
        );
    }

    #[test]
    fn test_nightly_routes_vary_by_staging() {
        let release = builder(false).signing(&signing_task(SigningIndex::Nightly));
        assert!(release.routes.contains(
            &"index.project.mobile.fenix.signed-nightly.nightly.2019.3.7.latest".to_string()
        ));
        assert!(release.routes.contains(
            &"index.project.mobile.fenix.signed-nightly.nightly.2019.3.7.revision.abcdef0123456789"
                .to_string()
        ));
        assert!(release
            .routes
            .contains(&"index.project.mobile.fenix.signed-nightly.nightly.latest".to_string()));

        let staging = builder(true).signing(&signing_task(SigningIndex::Nightly));
        assert!(staging.routes.contains(
            &"index.project.mobile.fenix.staging-signed-nightly.nightly.latest".to_string()
        ));
    }

    #[test]
    fn test_performance_routes_only_for_canonical_repository() {
        let index = SigningIndex::PerformanceTest(Architecture::Arm);
        let canonical = builder(false).signing_routes(index);
        assert_eq!(
            canonical,
            vec![
                "index.project.mobile.fenix.v2.performance-test.2019.3.7.latest.arm".to_string(),
                "index.project.mobile.fenix.v2.performance-test.2019.3.7.revision.abcdef0123456789.arm"
                    .to_string(),
                "index.project.mobile.fenix.v2.performance-test.latest.arm".to_string(),
            ]
        );

        let mut config = Config::default();
        config.project.canonical_repository = "https://github.com/someone-else/fenix".to_string();
        let fork = TaskBuilder::new(context(false), config);
        assert!(fork.signing_routes(index).is_empty());
    }

    #[test]
    fn test_nightly_signing_on_fork_has_no_routes() {
        let mut config = Config::default();
        config.project.canonical_repository = "https://github.com/someone-else/fenix".to_string();
        let fork = TaskBuilder::new(context(false), config.clone());
        assert!(fork.signing_routes(SigningIndex::Nightly).is_empty());

        let staging_fork = TaskBuilder::new(context(true), config);
        let task = staging_fork.signing(&signing_task(SigningIndex::Nightly));
        assert_eq!(
            task.routes,
            vec!["tc-treeherder.v2.fenix.abcdef0123456789".to_string()]
        );
    }

    #[test]
    fn test_publish_pools_and_scopes() {
        let publish_task = PublishTask {
            signing_task_id: "signing".to_string(),
            apks: vec!["public/app-arm-nightly-unsigned.apk".to_string()],
            ..PublishTask::default()
        };

        let release = builder(false).publish(&publish_task);
        assert_shared_invariants(&release);
        assert_eq!(release.worker_type, "mobile-pushapk-v1");
        assert_eq!(
            release.scopes,
            vec!["project:mobile:fenix:releng:googleplay:product:fenix".to_string()]
        );
        let value = serde_json::to_value(&release.payload).unwrap();
        assert_eq!(value["google_play_track"], "nightly");
        assert_eq!(value["upstreamArtifacts"][0]["taskType"], "signing");

        let staging = builder(true).publish(&publish_task);
        assert_eq!(staging.worker_type, "mobile-pushapk-dep-v1");
        assert_eq!(
            staging.scopes,
            vec!["project:mobile:fenix:releng:googleplay:product:fenix:dep".to_string()]
        );
    }
}
