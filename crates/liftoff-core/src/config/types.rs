//! Configuration types

use serde::{Deserialize, Serialize};

use crate::variant::Architecture;

/// Main configuration for Liftoff
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project identity and worker defaults
    pub project: ProjectConfig,

    /// Secrets materialised into the release build, project defaults when unset
    pub secrets: Option<Vec<SecretConfig>>,

    /// Signing configuration
    pub signing: SigningConfig,

    /// Store publishing configuration
    pub publish: PublishConfig,

    /// Pipeline shape
    pub pipeline: PipelineConfig,

    /// Queue service endpoints
    pub queue: QueueConfig,
}

impl Config {
    /// Secrets the release build fetches
    pub fn effective_secrets(&self) -> Vec<SecretConfig> {
        self.secrets
            .clone()
            .unwrap_or_else(|| default_secrets(&self.project.name))
    }
}

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name used in scopes, routes and worker pools
    pub name: String,

    /// Owner recorded in task metadata
    pub owner: String,

    /// Source URL recorded in task metadata
    pub source: String,

    /// Repository that is allowed to publish index routes
    pub canonical_repository: String,

    /// Address notified when build tasks fail
    pub notify_email: String,

    /// Address notified when performance tests fail
    pub perf_notify_email: String,

    /// Docker image for build tasks
    pub image: String,

    /// Maximum runtime of build tasks, in seconds
    pub max_run_time: u64,

    /// Maximum runtime of performance tests, in seconds
    pub perf_max_run_time: u64,

    /// Provisioner for build workers
    pub build_provisioner: String,

    /// Provisioner for signing and publishing workers
    pub scriptworker_provisioner: String,

    /// Provisioner for performance test devices
    pub perf_provisioner: String,

    /// Directory the build tool writes APKs to
    pub apk_root: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "fenix".to_string(),
            owner: "release-eng@example.com".to_string(),
            source: "https://github.com/example/fenix/tree/main/automation/taskcluster"
                .to_string(),
            canonical_repository: "https://github.com/example/fenix".to_string(),
            notify_email: "release-eng@example.com".to_string(),
            perf_notify_email: "perftest-alerts@example.com".to_string(),
            image: "mozillamobile/fenix:1.3".to_string(),
            max_run_time: 7200,
            perf_max_run_time: 2700,
            build_provisioner: "aws-provisioner-v1".to_string(),
            scriptworker_provisioner: "scriptworker-prov-v1".to_string(),
            perf_provisioner: "proj-autophone".to_string(),
            apk_root: "/opt/fenix/app/build/outputs/apk".to_string(),
        }
    }
}

/// A secret fetched inside the build task and written to a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    /// Secret name (without staging prefix)
    pub name: String,

    /// Key within the secret
    pub key: String,

    /// File the value is written to
    pub target: String,
}

/// Default secrets for a project
pub fn default_secrets(project: &str) -> Vec<SecretConfig> {
    vec![
        SecretConfig {
            name: format!("project/mobile/{}/sentry", project),
            key: "dsn".to_string(),
            target: ".sentry_token".to_string(),
        },
        SecretConfig {
            name: format!("project/mobile/{}/leanplum", project),
            key: "production".to_string(),
            target: ".leanplum_token".to_string(),
        },
    ]
}

/// Signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing format requested from the signing worker
    pub format: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            format: "autograph_apk".to_string(),
        }
    }
}

/// Store publishing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Whether the pipeline ends with a publish task
    pub enabled: bool,

    /// Release track on the store
    pub track: String,

    /// Whether the store transaction is committed
    pub commit: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            track: "nightly".to_string(),
            commit: false,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Build type of the multi-architecture release build
    pub build_type: String,

    /// Architectures included in the release build
    pub architectures: Vec<Architecture>,

    /// Variant used for unit tests and lint
    pub check_variant: String,

    /// Additional variants built alongside the release build
    pub extra_variants: Vec<String>,

    /// Performance tests run against signed release APKs
    pub performance_tests: Vec<PerformanceTestConfig>,

    /// Index path of the test-harness task used by performance tests
    pub harness_index_path: String,

    /// Repository the test harness is fetched from
    pub harness_repository: String,

    /// Application id of the APK under performance test
    pub performance_binary: String,

    /// Activity launched by the performance harness
    pub performance_activity: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            build_type: "nightly".to_string(),
            architectures: Architecture::ALL.to_vec(),
            check_variant: "x86Debug".to_string(),
            extra_variants: Vec::new(),
            performance_tests: Vec::new(),
            harness_index_path: "gecko.v2.mozilla-central.latest.firefox.android-hw-opt"
                .to_string(),
            harness_repository: "https://hg.mozilla.org/mozilla-central".to_string(),
            performance_binary: "org.mozilla.fenix.raptor".to_string(),
            performance_activity: "org.mozilla.fenix.browser.BrowserPerformanceTestActivity"
                .to_string(),
        }
    }
}

/// A performance test run on a physical device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceTestConfig {
    /// Harness test name (e.g. `raptor-tp6m-1`)
    pub test: String,

    /// Architecture of the APK under test
    pub architecture: Architecture,

    /// Dashboard job symbol
    pub symbol: String,

    /// Run on a 64-bit capable device regardless of architecture
    #[serde(default)]
    pub force_64bit: bool,

    /// Extra harness options appended to the command line
    #[serde(default)]
    pub extra_options: Vec<String>,
}

/// Queue service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue service base URL
    pub queue_url: String,

    /// Index service base URL
    pub index_url: String,

    /// Public queue URL that devices outside the cluster download artifacts from
    pub public_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_url: "http://taskcluster/queue/v1".to_string(),
            index_url: "http://taskcluster/index/v1".to_string(),
            public_url: "https://queue.taskcluster.net/v1".to_string(),
            timeout_secs: 60,
        }
    }
}
