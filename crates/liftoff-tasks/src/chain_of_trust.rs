//! Graph snapshot and chain-of-trust files
//!
//! The downstream verifier reads `task-graph.json`, a JSON object mapping
//! each task id to `{"task": <canonical definition>}`. It also expects
//! `actions.json` and `parameters.yml` to exist next to it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::Result;

pub const TASK_GRAPH_FILE: &str = "task-graph.json";
pub const ACTIONS_FILE: &str = "actions.json";
pub const PARAMETERS_FILE: &str = "parameters.yml";

/// Snapshot entry for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Definition as stored by the queue
    pub task: Value,
}

/// Canonical definitions of every submitted task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphSnapshot {
    tasks: BTreeMap<String, SnapshotEntry>,
}

impl GraphSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, task_id: impl Into<String>, canonical: Value) {
        self.tasks
            .insert(task_id.into(), SnapshotEntry { task: canonical });
    }

    pub fn get(&self, task_id: &str) -> Option<&Value> {
        self.tasks.get(task_id).map(|entry| &entry.task)
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &String> {
        self.tasks.keys()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Write `task-graph.json` into `dir`, replacing any previous file
#[instrument(skip(snapshot), fields(tasks = snapshot.len()))]
pub fn write_task_graph(dir: &Path, snapshot: &GraphSnapshot) -> Result<PathBuf> {
    let path = dir.join(TASK_GRAPH_FILE);
    let content = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(&path, content)?;
    info!(path = %path.display(), "task graph written");
    Ok(path)
}

/// Read a snapshot written by [`write_task_graph`]
pub fn load_task_graph(path: &Path) -> Result<GraphSnapshot> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write the empty files the verifier expects
pub fn write_placeholders(dir: &Path) -> Result<Vec<PathBuf>> {
    [ACTIONS_FILE, PARAMETERS_FILE]
        .iter()
        .map(|name| -> Result<PathBuf> {
            let path = dir.join(name);
            std::fs::write(&path, "{}")?;
            Ok(path)
        })
        .collect()
}

/// Persist the snapshot and the placeholder files; returns the graph file path
pub fn persist(dir: &Path, snapshot: &GraphSnapshot) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = write_task_graph(dir, snapshot)?;
    write_placeholders(dir)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn snapshot() -> GraphSnapshot {
        let mut snapshot = GraphSnapshot::new();
        snapshot.insert(
            "buildTask000000000000A",
            json!({"workerType": "mobile-3-b-fenix", "dependencies": ["anchor"], "tags": {}}),
        );
        snapshot.insert(
            "signTask0000000000000B",
            json!({"workerType": "mobile-signing-v1", "dependencies": ["anchor", "buildTask000000000000A"]}),
        );
        snapshot
    }

    #[test]
    fn test_persist_round_trip() {
        let temp = TempDir::new().unwrap();
        let original = snapshot();

        let path = persist(temp.path(), &original).unwrap();
        let loaded = load_task_graph(&path).unwrap();

        assert_eq!(
            loaded.task_ids().collect::<Vec<_>>(),
            original.task_ids().collect::<Vec<_>>()
        );
        for id in original.task_ids() {
            assert_eq!(loaded.get(id), original.get(id));
        }
    }

    #[test]
    fn test_file_layout() {
        let temp = TempDir::new().unwrap();
        persist(temp.path(), &snapshot()).unwrap();

        let raw: Value = serde_json::from_str(
            &std::fs::read_to_string(temp.path().join(TASK_GRAPH_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(
            raw["buildTask000000000000A"]["task"]["workerType"],
            "mobile-3-b-fenix"
        );

        for name in [ACTIONS_FILE, PARAMETERS_FILE] {
            assert_eq!(std::fs::read_to_string(temp.path().join(name)).unwrap(), "{}");
        }
    }

    #[test]
    fn test_persist_overwrites_previous_graph() {
        let temp = TempDir::new().unwrap();
        persist(temp.path(), &snapshot()).unwrap();

        let mut smaller = GraphSnapshot::new();
        smaller.insert("only", json!({}));
        let path = persist(temp.path(), &smaller).unwrap();

        assert_eq!(load_task_graph(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_persist_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("artifacts").join("public");
        let path = persist(&dir, &snapshot()).unwrap();
        assert!(path.exists());
    }
}
