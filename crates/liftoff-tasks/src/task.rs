//! Task definition model
//!
//! Mirrors the JSON document the queue accepts in `createTask`. Field names
//! serialize in camelCase; timestamps serialize as RFC 3339 with
//! millisecond precision.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use liftoff_core::Priority;

/// Dependency policy of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Requires {
    /// Every dependency must complete successfully
    #[default]
    AllCompleted,
}

/// A complete task definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub provisioner_id: String,
    pub worker_type: String,
    pub task_group_id: String,
    pub scheduler_id: String,
    #[serde(with = "timestamp")]
    pub created: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub deadline: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub expires: DateTime<Utc>,
    pub retries: u32,
    pub tags: BTreeMap<String, String>,
    pub priority: Priority,
    /// Anchor task first, then the caller's dependencies
    pub dependencies: Vec<String>,
    pub requires: Requires,
    pub routes: Vec<String>,
    pub scopes: Vec<String>,
    pub payload: Payload,
    pub metadata: TaskMetadata,
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl TaskDefinition {
    /// Number of artifacts the payload declares
    pub fn declared_artifacts(&self) -> usize {
        self.payload.declared_artifacts()
    }

    /// Feature flags of the payload
    pub fn features(&self) -> Features {
        self.payload.features()
    }

    /// Whether any scope grants access to a secret
    pub fn has_secret_scopes(&self) -> bool {
        self.scopes.iter().any(|s| s.starts_with(SECRET_SCOPE_PREFIX))
    }

    /// Dependencies other than the anchor
    pub fn upstream(&self) -> &[String] {
        self.dependencies.get(1..).unwrap_or_default()
    }
}

/// Prefix of scopes that let a task fetch secrets through the proxy
pub const SECRET_SCOPE_PREFIX: &str = "secrets:";

/// Human-readable metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub name: String,
    pub description: String,
    pub owner: String,
    pub source: String,
}

/// Worker feature flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    /// Worker signs a chain-of-trust certificate for the artifacts
    #[serde(default, skip_serializing_if = "is_false")]
    pub chain_of_trust: bool,

    /// Worker runs the authenticating proxy
    #[serde(default, skip_serializing_if = "is_false")]
    pub taskcluster_proxy: bool,
}

impl Features {
    pub fn is_empty(&self) -> bool {
        !self.chain_of_trust && !self.taskcluster_proxy
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Worker payload, one shape per worker implementation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Docker(DockerPayload),
    Device(DevicePayload),
    Publish(PublishPayload),
    Signing(SigningPayload),
}

impl Payload {
    pub fn declared_artifacts(&self) -> usize {
        match self {
            Payload::Docker(p) => p.artifacts.len(),
            Payload::Device(p) => p.artifacts.len(),
            Payload::Publish(_) | Payload::Signing(_) => 0,
        }
    }

    pub fn features(&self) -> Features {
        match self {
            Payload::Docker(p) => p.features,
            Payload::Device(p) => p.features,
            Payload::Publish(p) => p.features,
            Payload::Signing(p) => p.features,
        }
    }

    pub fn set_features(&mut self, features: Features) {
        match self {
            Payload::Docker(p) => p.features = features,
            Payload::Device(p) => p.features = features,
            Payload::Publish(p) => p.features = features,
            Payload::Signing(p) => p.features = features,
        }
    }
}

/// Payload of a docker-worker task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerPayload {
    pub features: Features,
    pub max_run_time: u64,
    pub image: String,
    pub command: Vec<String>,
    /// Artifact name to file in the container
    pub artifacts: BTreeMap<String, Artifact>,
}

/// Payload of a task run on a physical device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePayload {
    pub features: Features,
    pub max_run_time: u64,
    pub command: Vec<Vec<String>>,
    pub artifacts: Vec<NamedArtifact>,
    pub env: BTreeMap<String, String>,
    pub mounts: Vec<Mount>,
}

/// Payload of a signing task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningPayload {
    pub upstream_artifacts: Vec<UpstreamArtifacts>,
    #[serde(default, skip_serializing_if = "Features::is_empty")]
    pub features: Features,
}

/// Payload of a store-publishing task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPayload {
    /// Whether the store transaction is committed
    pub commit: bool,
    #[serde(rename = "google_play_track")]
    pub track: String,
    pub upstream_artifacts: Vec<UpstreamArtifacts>,
    #[serde(default, skip_serializing_if = "Features::is_empty")]
    pub features: Features,
}

/// Kind of a declared artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    File,
    Directory,
}

/// An artifact keyed by name in the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub path: String,
    #[serde(with = "timestamp")]
    pub expires: DateTime<Utc>,
}

/// An artifact carrying its own name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedArtifact {
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub name: String,
    pub path: String,
    #[serde(with = "timestamp")]
    pub expires: DateTime<Utc>,
}

/// Artifacts of an upstream task consumed by a scriptworker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamArtifacts {
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<String>,
    pub task_id: String,
    pub task_type: String,
}

/// A file fetched into the task directory before the command runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mount {
    pub content: MountContent,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountContent {
    pub url: String,
}

/// Extra section of the definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treeherder: Option<Treeherder>,
}

impl Extra {
    pub fn is_empty(&self) -> bool {
        self.treeherder.is_none()
    }
}

/// Classification of a job on the reporting dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Build,
    Test,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub platform: String,
}

/// Reporting dashboard annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treeherder {
    pub machine: Machine,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_symbol: Option<String>,
    pub tier: u8,
    pub job_kind: JobKind,
    pub collection: BTreeMap<String, bool>,
}

impl Treeherder {
    /// Tier 1 annotation in the `opt` collection
    pub fn new(symbol: impl Into<String>, platform: impl Into<String>, job_kind: JobKind) -> Self {
        Self {
            machine: Machine {
                platform: platform.into(),
            },
            symbol: symbol.into(),
            group_symbol: None,
            tier: 1,
            job_kind,
            collection: BTreeMap::from([("opt".to_string(), true)]),
        }
    }

    pub fn with_group(mut self, group_symbol: impl Into<String>) -> Self {
        self.group_symbol = Some(group_symbol.into());
        self
    }

    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = BTreeMap::from([(collection.into(), true)]);
        self
    }
}

mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use liftoff_core::clock::queue_timestamp;

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&queue_timestamp(*at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 3, 7, 10, 0, 0).unwrap()
    }

    fn signing_definition() -> TaskDefinition {
        TaskDefinition {
            provisioner_id: "scriptworker-prov-v1".to_string(),
            worker_type: "mobile-signing-dep-v1".to_string(),
            task_group_id: "anchor".to_string(),
            scheduler_id: "taskcluster-github".to_string(),
            created: at(),
            deadline: at() + chrono::Duration::days(1),
            expires: at() + chrono::Duration::days(365),
            retries: 5,
            tags: BTreeMap::new(),
            priority: Priority::Lowest,
            dependencies: vec!["anchor".to_string(), "build".to_string()],
            requires: Requires::AllCompleted,
            routes: Vec::new(),
            scopes: Vec::new(),
            payload: Payload::Signing(SigningPayload {
                upstream_artifacts: vec![UpstreamArtifacts {
                    paths: vec!["public/app.apk".to_string()],
                    formats: vec!["autograph_apk".to_string()],
                    task_id: "build".to_string(),
                    task_type: "build".to_string(),
                }],
                features: Features::default(),
            }),
            metadata: TaskMetadata {
                name: "Signing task".to_string(),
                description: "Sign release builds".to_string(),
                owner: "release-eng@example.com".to_string(),
                source: "https://github.com/example/fenix".to_string(),
            },
            extra: Extra::default(),
        }
    }

    #[test]
    fn test_serializes_queue_field_names() {
        let value = serde_json::to_value(signing_definition()).unwrap();
        assert_eq!(value["provisionerId"], "scriptworker-prov-v1");
        assert_eq!(value["created"], "2019-03-07T10:00:00.000Z");
        assert_eq!(value["requires"], "all-completed");
        assert_eq!(value["priority"], "lowest");
        assert_eq!(
            value["payload"]["upstreamArtifacts"][0]["taskType"],
            "build"
        );
        assert!(value.get("extra").is_none());
        assert!(value["payload"].get("features").is_none());
    }

    #[test]
    fn test_features_skip_unset_flags() {
        let features = Features {
            chain_of_trust: true,
            taskcluster_proxy: false,
        };
        assert_eq!(serde_json::to_value(features).unwrap(), json!({"chainOfTrust": true}));
        assert_eq!(serde_json::to_value(Features::default()).unwrap(), json!({}));
    }

    #[test]
    fn test_publish_payload_keeps_store_track_key() {
        let payload = Payload::Publish(PublishPayload {
            commit: false,
            track: "nightly".to_string(),
            upstream_artifacts: Vec::new(),
            features: Features::default(),
        });
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["google_play_track"], "nightly");
        assert_eq!(value["commit"], false);
    }

    #[test]
    fn test_deserialize_round_trip() {
        let definition = signing_definition();
        let value = serde_json::to_value(&definition).unwrap();
        let parsed: TaskDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, definition);
        assert_eq!(parsed.upstream(), ["build".to_string()]);
    }

    #[test]
    fn test_treeherder_annotation() {
        let annotation = Treeherder::new("B", "android-all", JobKind::Build)
            .with_group("nightly")
            .with_collection("debug");
        let value = serde_json::to_value(annotation).unwrap();
        assert_eq!(value["machine"]["platform"], "android-all");
        assert_eq!(value["groupSymbol"], "nightly");
        assert_eq!(value["jobKind"], "build");
        assert_eq!(value["collection"], json!({"debug": true}));
    }
}
