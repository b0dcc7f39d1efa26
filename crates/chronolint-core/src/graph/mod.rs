//! Task dependency graph.
//!
//! Tasks are nodes of a `petgraph` DAG, looked up through a map of stable task
//! ids, so validation and ordering never depend on input position. Building
//! the graph runs three checks in order:
//!
//! 1. every referenced id names a task in the set (`MissingDependency`)
//! 2. the relation is acyclic (`CyclicDependency`, self-references included)
//! 3. a deterministic topological order exists
//!
//! Ties in the order are broken by deadline (earliest first, none last) and
//! then by id.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::GraphError;
use crate::task::{cmp_deadline, Task};

#[derive(Debug, Clone)]
struct TaskNode {
    id: String,
    deadline: Option<DateTime<Utc>>,
}

/// Validated, acyclic dependency graph over a task set.
///
/// Edges point from a task to the task it depends on.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    dag: DiGraph<TaskNode, ()>,
    index: BTreeMap<String, NodeIndex>,
    order: Vec<NodeIndex>,
}

impl DependencyGraph {
    /// Build and validate the graph for `tasks`.
    ///
    /// # Errors
    /// - `DuplicateTask` if two tasks share an id
    /// - `MissingDependency` for the first unknown reference (by task id, then
    ///   dependency id)
    /// - `CyclicDependency` with the cycle rotated to start at its lowest id
    pub fn build(tasks: &[Task]) -> Result<Self, GraphError> {
        Self::build_with_edges(tasks, &BTreeMap::new())
    }

    /// Build the graph with extra `task id -> dependency ids` edges merged in.
    ///
    /// Entries keyed by ids that are not in `tasks` are ignored; their values
    /// are validated like any other dependency.
    pub fn build_with_edges(
        tasks: &[Task],
        extra_edges: &BTreeMap<String, Vec<String>>,
    ) -> Result<Self, GraphError> {
        let mut dag = DiGraph::with_capacity(tasks.len(), 0);
        let mut index = BTreeMap::new();

        for task in tasks {
            if index.contains_key(&task.id) {
                return Err(GraphError::DuplicateTask(task.id.clone()));
            }
            let node = dag.add_node(TaskNode {
                id: task.id.clone(),
                deadline: task.deadline,
            });
            index.insert(task.id.clone(), node);
        }

        // Collect referenced ids per task in id order so the first reported
        // missing reference is deterministic.
        let mut references: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for task in tasks {
            references
                .entry(task.id.as_str())
                .or_default()
                .extend(task.dependency_ids.iter());
        }
        for (task_id, deps) in extra_edges {
            if let Some(entry) = references.get_mut(task_id.as_str()) {
                entry.extend(deps.iter().map(|d| d.trim()).filter(|d| !d.is_empty()));
            }
        }

        for (task_id, deps) in &references {
            let from = index[*task_id];
            for dep in deps {
                let Some(&to) = index.get(*dep) else {
                    return Err(GraphError::MissingDependency {
                        task_id: task_id.to_string(),
                        missing_id: dep.to_string(),
                    });
                };
                dag.add_edge(from, to, ());
            }
        }

        let mut graph = Self {
            dag,
            index,
            order: Vec::new(),
        };

        if petgraph::algo::is_cyclic_directed(&graph.dag) {
            let cycle = graph.find_cycle();
            tracing::debug!(cycle = ?cycle, "dependency cycle detected");
            return Err(GraphError::CyclicDependency { cycle });
        }

        graph.order = graph.kahn_order();
        Ok(graph)
    }

    fn id(&self, node: NodeIndex) -> &str {
        &self.dag[node].id
    }

    /// Neighbours of `node` in `direction`, in ascending id order
    fn neighbours_by_id(&self, node: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self.dag.neighbors_directed(node, direction).collect();
        out.sort_by(|a, b| self.id(*a).cmp(self.id(*b)));
        out.dedup();
        out
    }

    /// Cycle through the lowest id that sits on any cycle, following
    /// task -> dependency edges. Only called on cyclic graphs.
    fn find_cycle(&self) -> Vec<String> {
        let on_cycle = |scc: &Vec<NodeIndex>| {
            scc.len() > 1 || self.dag.find_edge(scc[0], scc[0]).is_some()
        };
        let Some(component) = petgraph::algo::tarjan_scc(&self.dag)
            .into_iter()
            .filter(|scc| !scc.is_empty() && on_cycle(scc))
            .min_by(|a, b| self.lowest_id(a).cmp(self.lowest_id(b)))
        else {
            return Vec::new();
        };

        let members: BTreeSet<NodeIndex> = component.iter().copied().collect();
        let start = component
            .iter()
            .copied()
            .min_by(|a, b| self.id(*a).cmp(self.id(*b)))
            .unwrap_or(component[0]);

        // Depth-first walk inside the component until an edge returns to start
        let mut visited: BTreeSet<NodeIndex> = BTreeSet::from([start]);
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> =
            vec![(start, self.neighbours_by_id(start, Direction::Outgoing), 0)];

        while let Some((_, neighbours, pos)) = stack.last_mut() {
            let Some(&next) = neighbours.get(*pos) else {
                stack.pop();
                continue;
            };
            *pos += 1;

            if next == start {
                return stack.iter().map(|(n, _, _)| self.id(*n).to_string()).collect();
            }
            if members.contains(&next) && visited.insert(next) {
                let deps = self.neighbours_by_id(next, Direction::Outgoing);
                stack.push((next, deps, 0));
            }
        }

        vec![self.id(start).to_string()]
    }

    fn lowest_id(&self, nodes: &[NodeIndex]) -> &str {
        nodes.iter().map(|n| self.id(*n)).min().unwrap_or_default()
    }

    /// Kahn's algorithm, dependencies first. Only called on acyclic graphs.
    fn kahn_order(&self) -> Vec<NodeIndex> {
        let mut remaining: Vec<usize> = self
            .dag
            .node_indices()
            .map(|n| self.dag.edges_directed(n, Direction::Outgoing).count())
            .collect();
        let mut ready: Vec<NodeIndex> = self
            .dag
            .node_indices()
            .filter(|n| remaining[n.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.dag.node_count());

        while !ready.is_empty() {
            // Smallest (deadline, id) first; ready sets stay small.
            ready.sort_by(|a, b| self.priority_cmp(*b, *a));
            let Some(next) = ready.pop() else { break };
            order.push(next);

            for edge in self.dag.edges_directed(next, Direction::Incoming) {
                let dependent = edge.source();
                remaining[dependent.index()] -= 1;
                if remaining[dependent.index()] == 0 {
                    ready.push(dependent);
                }
            }
        }

        order
    }

    fn priority_cmp(&self, a: NodeIndex, b: NodeIndex) -> std::cmp::Ordering {
        let (a, b) = (&self.dag[a], &self.dag[b]);
        cmp_deadline(a.deadline, b.deadline).then_with(|| a.id.cmp(&b.id))
    }

    /// Task ids with every dependency before its dependents
    pub fn topological_order(&self) -> Vec<&str> {
        self.order.iter().map(|&n| self.id(n)).collect()
    }

    /// Ids `task_id` directly depends on, ascending. Empty for unknown ids.
    pub fn dependencies_of(&self, task_id: &str) -> Vec<&str> {
        self.adjacent_ids(task_id, Direction::Outgoing)
    }

    /// Ids that directly depend on `task_id`, ascending
    pub fn dependents_of(&self, task_id: &str) -> Vec<&str> {
        self.adjacent_ids(task_id, Direction::Incoming)
    }

    fn adjacent_ids(&self, task_id: &str, direction: Direction) -> Vec<&str> {
        self.index
            .get(task_id)
            .map(|&n| {
                self.neighbours_by_id(n, direction)
                    .into_iter()
                    .map(|d| self.id(d))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.dag.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.dag.node_count() == 0
    }

    /// Number of distinct dependency edges
    pub fn edge_count(&self) -> usize {
        self.dag.edge_count()
    }
}

/// Validate `tasks` and return their ids in dependency order.
pub fn order_tasks(tasks: &[Task]) -> Result<Vec<String>, GraphError> {
    let graph = DependencyGraph::build(tasks)?;
    Ok(graph
        .topological_order()
        .into_iter()
        .map(str::to_string)
        .collect())
}
