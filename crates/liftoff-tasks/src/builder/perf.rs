//! Performance tests on physical devices

use std::collections::BTreeMap;

use liftoff_core::clock::default_expiry;
use liftoff_core::{Architecture, Variant, VariantError};
use serde_json::json;

use super::{apk_artifact_name, notify_on_failure, TaskBuilder, TaskTemplate};
use crate::task::{
    ArtifactKind, DevicePayload, JobKind, Mount, MountContent, NamedArtifact, Payload,
    TaskDefinition, Treeherder,
};

/// Device pool a performance test runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceDevice {
    /// 64-bit capable device
    Pixel2,
    /// 32-bit ARM device
    MotoG5,
}

impl PerformanceDevice {
    /// Pick the device for an architecture. Forcing 64-bit moves ARM builds
    /// to the 64-bit capable pool; there are no x86 devices.
    pub fn select(variant: &Variant, force_64bit: bool) -> Result<Self, VariantError> {
        match (variant.architecture, force_64bit) {
            (Architecture::X86, _) => Err(VariantError::UnsupportedArchitecture(
                variant.name.clone(),
            )),
            (Architecture::Aarch64, _) | (Architecture::Arm, true) => Ok(PerformanceDevice::Pixel2),
            (Architecture::Arm, false) => Ok(PerformanceDevice::MotoG5),
        }
    }

    pub fn worker_type(&self) -> &'static str {
        match self {
            PerformanceDevice::Pixel2 => "gecko-t-bitbar-gw-perf-p2",
            PerformanceDevice::MotoG5 => "gecko-t-bitbar-gw-perf-g5",
        }
    }

    /// Dashboard platform for an APK of `arch` on this device
    pub fn platform(&self, arch: Architecture) -> &'static str {
        match (self, arch) {
            (PerformanceDevice::Pixel2, Architecture::Aarch64) => "android-hw-p2-8-0-android-aarch64",
            (PerformanceDevice::Pixel2, _) => "android-hw-p2-8-0-arm7-api-16",
            (PerformanceDevice::MotoG5, _) => "android-hw-g5-7-0-arm7-api-16",
        }
    }
}

/// A harness run against a signed APK
#[derive(Debug, Clone)]
pub struct PerformanceTestTask {
    pub signing_task_id: String,
    /// Task providing the test harness
    pub harness_task_id: String,
    /// Revision the harness was built from
    pub harness_revision: String,
    /// Variant under test, e.g. `armNightly`
    pub variant: String,
    /// Harness test name
    pub test: String,
    pub symbol: String,
    pub group_symbol: String,
    pub force_64bit: bool,
    pub extra_options: Vec<String>,
}

impl Default for PerformanceTestTask {
    fn default() -> Self {
        Self {
            signing_task_id: String::new(),
            harness_task_id: String::new(),
            harness_revision: String::new(),
            variant: String::new(),
            test: String::new(),
            symbol: String::new(),
            group_symbol: "Rap".to_string(),
            force_64bit: false,
            extra_options: Vec::new(),
        }
    }
}

/// Output directories collected from the device host
const OUTPUT_DIRECTORIES: [(&str, &str); 3] = [
    ("public/test/", "artifacts/public"),
    ("public/logs/", "workspace/logs"),
    ("public/test_info/", "workspace/build/blobber_upload_dir"),
];

impl TaskBuilder {
    /// Run a harness test against the signed APK of a variant
    pub fn performance_test(
        &self,
        task: &PerformanceTestTask,
    ) -> Result<TaskDefinition, VariantError> {
        let variant = Variant::decode(&task.variant)?;
        let device = PerformanceDevice::select(&variant, task.force_64bit)?;
        let worker_type = device.worker_type();
        let pipeline = &self.config.pipeline;

        let public_url = self.config.queue.public_url.trim_end_matches('/');
        let apk_url = format!(
            "{}/task/{}/artifacts/{}",
            public_url,
            task.signing_task_id,
            apk_artifact_name(&variant)
        );
        let harness_artifacts = format!(
            "{}/task/{}/artifacts/public/build/en-US",
            public_url, task.harness_task_id
        );

        let mut command = vec![
            "/builds/taskcluster/script.py".to_string(),
            "bash".to_string(),
            "./test-linux.sh".to_string(),
            "--cfg=mozharness/configs/raptor/android_hw_config.py".to_string(),
            format!("--test={}", task.test),
            format!("--app={}", self.project()),
            format!("--binary={}", pipeline.performance_binary),
            format!("--activity={}", pipeline.performance_activity),
            "--download-symbols=ondemand".to_string(),
        ];
        command.extend(task.extra_options.iter().cloned());

        let extra_config = json!({
            "installer_url": apk_url,
            "test_packages_url": format!("{}/target.test_packages.json", harness_artifacts),
        });

        let env: BTreeMap<String, String> = [
            ("EXTRA_MOZHARNESS_CONFIG", extra_config.to_string()),
            ("GECKO_HEAD_REPOSITORY", pipeline.harness_repository.clone()),
            ("GECKO_HEAD_REV", task.harness_revision.clone()),
            ("MOZ_AUTOMATION", "1".to_string()),
            ("MOZ_HIDE_RESULTS_TABLE", "1".to_string()),
            ("MOZ_NO_REMOTE", "1".to_string()),
            ("MOZ_NODE_PATH", "/usr/local/bin/node".to_string()),
            ("MOZHARNESS_CONFIG", "raptor/android_hw_config.py".to_string()),
            ("MOZHARNESS_SCRIPT", "raptor_script.py".to_string()),
            ("MOZHARNESS_URL", format!("{}/mozharness.zip", harness_artifacts)),
            ("MOZILLA_BUILD_URL", apk_url.clone()),
            ("NEED_XVFB", "false".to_string()),
            ("NO_FAIL_ON_TEST_ERRORS", "1".to_string()),
            ("SCCACHE_DISABLE", "1".to_string()),
            (
                "TASKCLUSTER_WORKER_TYPE",
                worker_type
                    .strip_prefix("gecko-")
                    .unwrap_or(worker_type)
                    .to_string(),
            ),
            ("XPCSHELL_NAME", "xpcshell".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let expires = self.clock.from_now(default_expiry());
        let artifacts = OUTPUT_DIRECTORIES
            .iter()
            .map(|(name, path)| NamedArtifact {
                kind: ArtifactKind::Directory,
                name: name.to_string(),
                path: path.to_string(),
                expires,
            })
            .collect();

        let payload = Payload::Device(DevicePayload {
            features: Default::default(),
            max_run_time: self.config.project.perf_max_run_time,
            command: vec![command],
            artifacts,
            env,
            mounts: vec![Mount {
                content: MountContent {
                    url: format!(
                        "{}/raw-file/{}/taskcluster/scripts/tester/test-linux.sh",
                        pipeline.harness_repository.trim_end_matches('/'),
                        task.harness_revision
                    ),
                },
                file: "test-linux.sh".to_string(),
            }],
        });

        let device_note = if task.force_64bit && variant.architecture == Architecture::Arm {
            ", on 64-bit device"
        } else {
            ""
        };

        let template = TaskTemplate::new(
            format!("performance test: {} ({}{})", task.test, variant.label(), device_note),
            format!("Run {} against {} {}", task.test, self.project(), variant),
            self.config.project.perf_provisioner.clone(),
            worker_type,
            payload,
        )
        .with_dependencies([task.signing_task_id.clone(), task.harness_task_id.clone()])
        .with_routes([notify_on_failure(&self.config.project.perf_notify_email)])
        .with_treeherder(
            Treeherder::new(
                task.symbol.clone(),
                device.platform(variant.architecture),
                JobKind::Test,
            )
            .with_group(task.group_symbol.clone())
            .with_tier(2),
        );

        Ok(self.finalize(template))
    }
}
