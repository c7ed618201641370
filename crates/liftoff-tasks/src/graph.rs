//! Task graph construction and ordering
//!
//! A [`TaskGraph`] is an ordered sequence of groups. Every dependency of a
//! task in group N is either an external task that already exists in the
//! queue (the decision task, the harness task) or a task in a group before
//! N. Submitting the groups in order therefore never references a task the
//! queue has not seen.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::GraphError;
use crate::task::TaskDefinition;

/// Tasks that may be submitted together
pub type TaskGroup = BTreeMap<String, TaskDefinition>;

/// Ordered groups of task definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskGraph {
    groups: Vec<TaskGroup>,
    external: BTreeSet<String>,
}

impl TaskGraph {
    /// Build a graph from explicit groups
    pub fn from_groups(
        groups: Vec<TaskGroup>,
        external: impl IntoIterator<Item = String>,
    ) -> Result<Self, GraphError> {
        let graph = Self {
            groups,
            external: external.into_iter().collect(),
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Place tasks into the earliest group their dependencies allow.
    ///
    /// Group numbers are computed from a topological order: a task lands one
    /// group after its latest in-graph dependency, or in group 0 when it
    /// only depends on external tasks.
    #[instrument(skip_all, fields(task_count = tasks.len()))]
    pub fn from_tasks(
        tasks: Vec<(String, TaskDefinition)>,
        external: impl IntoIterator<Item = String>,
    ) -> Result<Self, GraphError> {
        let external: BTreeSet<String> = external.into_iter().collect();
        let mut definitions: HashMap<String, TaskDefinition> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for (id, definition) in tasks {
            if definitions.contains_key(&id) || external.contains(&id) {
                return Err(GraphError::DuplicateTask(id));
            }
            order.push(id.clone());
            definitions.insert(id, definition);
        }

        for id in &order {
            for dependency in &definitions[id].dependencies {
                if !definitions.contains_key(dependency) && !external.contains(dependency) {
                    return Err(GraphError::UnknownDependency {
                        task_id: id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let sorted = topological_sort(&order, &definitions)?;
        let group_of = compute_groups(&sorted, &definitions);

        let group_count = group_of.values().max().map(|g| g + 1).unwrap_or(0);
        let mut groups: Vec<TaskGroup> = vec![TaskGroup::new(); group_count];
        for (id, definition) in definitions {
            let group = group_of[&id];
            groups[group].insert(id, definition);
        }

        info!(
            task_count = order.len(),
            group_count = groups.len(),
            "task graph built"
        );

        Ok(Self { groups, external })
    }

    /// Check id uniqueness and that every dependency points backwards
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut seen: HashSet<&str> = self.external.iter().map(String::as_str).collect();

        for (index, group) in self.groups.iter().enumerate() {
            for id in group.keys() {
                if seen.contains(id.as_str()) {
                    return Err(GraphError::DuplicateTask(id.clone()));
                }
            }

            for (id, definition) in group {
                for dependency in &definition.dependencies {
                    if !seen.contains(dependency.as_str()) {
                        return Err(GraphError::GraphOrdering {
                            task_id: id.clone(),
                            group: index,
                            dependency: dependency.clone(),
                        });
                    }
                }
            }

            seen.extend(group.keys().map(String::as_str));
        }

        Ok(())
    }

    pub fn groups(&self) -> &[TaskGroup] {
        &self.groups
    }

    /// Tasks the graph depends on but does not create
    pub fn external(&self) -> &BTreeSet<String> {
        &self.external
    }

    pub fn get(&self, id: &str) -> Option<&TaskDefinition> {
        self.groups.iter().find_map(|group| group.get(id))
    }

    /// Group index of a task
    pub fn group_of(&self, id: &str) -> Option<usize> {
        self.groups.iter().position(|group| group.contains_key(id))
    }

    /// Every task, group by group
    pub fn tasks(&self) -> impl Iterator<Item = (&String, &TaskDefinition)> {
        self.groups.iter().flat_map(|group| group.iter())
    }

    /// Total number of tasks
    pub fn len(&self) -> usize {
        self.groups.iter().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable summary of the submission plan
    pub fn execution_plan(&self) -> String {
        let mut plan = String::new();
        for (i, group) in self.groups.iter().enumerate() {
            plan.push_str(&format!("Group {} ({} tasks):\n", i, group.len()));
            for (id, definition) in group {
                let upstream = definition.upstream();
                if upstream.is_empty() {
                    plan.push_str(&format!(
                        "  {} -> {} [{}]\n",
                        id, definition.metadata.name, definition.worker_type
                    ));
                } else {
                    plan.push_str(&format!(
                        "  {} -> {} [{}] (after: {})\n",
                        id,
                        definition.metadata.name,
                        definition.worker_type,
                        upstream.join(", ")
                    ));
                }
            }
        }
        plan
    }
}

/// Kahn's algorithm over in-graph edges, keeping insertion order for ties
fn topological_sort(
    order: &[String],
    definitions: &HashMap<String, TaskDefinition>,
) -> Result<Vec<String>, GraphError> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for id in order {
        let internal: BTreeSet<&str> = definitions[id]
            .dependencies
            .iter()
            .map(String::as_str)
            .filter(|d| definitions.contains_key(*d))
            .collect();
        for dependency in &internal {
            dependents.entry(*dependency).or_default().push(id.as_str());
        }
        in_degree.insert(id.as_str(), internal.len());
        if internal.is_empty() {
            queue.push_back(id.as_str());
        }
    }

    let mut sorted = Vec::with_capacity(order.len());
    while let Some(id) = queue.pop_front() {
        sorted.push(id.to_string());
        for dependent in dependents.get(id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    queue.push_back(*dependent);
                }
            }
        }
    }

    if sorted.len() != order.len() {
        let done: HashSet<&str> = sorted.iter().map(String::as_str).collect();
        let cyclic: Vec<&str> = order
            .iter()
            .map(String::as_str)
            .filter(|id| !done.contains(id))
            .collect();
        return Err(GraphError::CyclicDependency(cyclic.join(", ")));
    }

    Ok(sorted)
}

fn compute_groups(
    sorted: &[String],
    definitions: &HashMap<String, TaskDefinition>,
) -> HashMap<String, usize> {
    let mut group_of: HashMap<String, usize> = HashMap::new();
    for id in sorted {
        let group = definitions[id]
            .dependencies
            .iter()
            .filter_map(|dependency| group_of.get(dependency))
            .max()
            .map(|g| g + 1)
            .unwrap_or(0);
        group_of.insert(id.clone(), group);
    }
    group_of
}
