//! The dependency registry: the set of task ids known to a submission, plus
//! the submission-time validation that runs against it.
//!
//! The registry is immutable after submission, so concurrent readers
//! require no synchronization.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{OrchestratorError, Result};
use crate::task::TaskNode;

pub struct DependencyRegistry {
    known_ids: HashSet<String>,
}

impl DependencyRegistry {
    pub fn build(nodes: &[TaskNode]) -> Self {
        Self {
            known_ids: nodes.iter().map(|n| n.id.clone()).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.known_ids.contains(id)
    }

    /// Every dependency in every task node must be present in the registry.
    /// A missing one is a hallucinated dependency and rejects the whole
    /// submission before any task executes.
    pub fn check_hallucinated_dependencies(&self, nodes: &[TaskNode]) -> Result<()> {
        for node in nodes {
            for dep in &node.dependencies {
                if !self.known_ids.contains(dep) {
                    return Err(OrchestratorError::HallucinatedDependency {
                        task_id: node.id.clone(),
                        missing_dependency: dep.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Every declared `input_schema`/`output_schema` must itself be a valid
/// JSON Schema document. `Value::Null` means "no schema declared" and is
/// always well-formed. This checks well-formedness only, not conformance of
/// any particular instance — instance validation happens per-payload in the
/// pipeline's output step.
pub fn check_schemas(nodes: &[TaskNode]) -> Result<()> {
    for node in nodes {
        for schema in [&node.input_schema, &node.output_schema] {
            if schema.is_null() {
                continue;
            }
            if let Err(e) = jsonschema::JSONSchema::compile(schema) {
                return Err(OrchestratorError::SchemaRejected {
                    task_id: node.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Kahn's algorithm: repeatedly strip nodes with no unsatisfied
/// predecessors. A non-empty remainder after the graph is exhausted means a
/// cycle. Returns levels in execution order.
pub fn compute_levels(nodes: &[TaskNode]) -> Result<Vec<Vec<String>>> {
    let mut indegree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in nodes {
        indegree.entry(&node.id).or_insert(0);
        for dep in &node.dependencies {
            *indegree.entry(&node.id).or_insert(0) += 1;
            dependents.entry(dep.as_str()).or_default().push(&node.id);
        }
    }

    let mut frontier: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();
    // Stable order so two identical submissions level identically (invariant 12).
    let mut frontier_vec: Vec<&str> = frontier.drain(..).collect();
    frontier_vec.sort();
    let mut frontier: VecDeque<&str> = frontier_vec.into();

    let mut levels = Vec::new();
    let mut visited = 0usize;

    while !frontier.is_empty() {
        let mut level: Vec<&str> = frontier.drain(..).collect();
        level.sort();
        visited += level.len();

        let mut next_frontier = Vec::new();
        for &id in &level {
            if let Some(deps) = dependents.get(id) {
                for &dependent in deps {
                    let entry = indegree.get_mut(dependent).expect("dependent was registered");
                    *entry -= 1;
                    if *entry == 0 {
                        next_frontier.push(dependent);
                    }
                }
            }
        }
        next_frontier.sort();
        frontier.extend(next_frontier);
        levels.push(level.into_iter().map(String::from).collect());
    }

    if visited != nodes.len() {
        let cycle: Vec<String> = indegree
            .into_iter()
            .filter(|&(_, deg)| deg > 0)
            .map(|(id, _)| id.to_string())
            .collect();
        return Err(OrchestratorError::CircularDependency { cycle });
    }

    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::AgentRole;

    fn node(id: &str, deps: &[&str]) -> TaskNode {
        TaskNode::new(id, AgentRole::Worker)
            .with_dependencies(deps.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn hallucinated_dependency_is_rejected() {
        let nodes = vec![node("t1", &["ghost"])];
        let registry = DependencyRegistry::build(&nodes);
        let err = registry.check_hallucinated_dependencies(&nodes).unwrap_err();
        assert!(matches!(err, OrchestratorError::HallucinatedDependency { .. }));
    }

    #[test]
    fn known_dependency_passes() {
        let nodes = vec![node("t1", &[]), node("t2", &["t1"])];
        let registry = DependencyRegistry::build(&nodes);
        assert!(registry.check_hallucinated_dependencies(&nodes).is_ok());
    }

    #[test]
    fn linear_chain_levels_in_order() {
        let nodes = vec![node("t1", &[]), node("t2", &["t1"]), node("t3", &["t2"])];
        let levels = compute_levels(&nodes).unwrap();
        assert_eq!(levels, vec![vec!["t1"], vec!["t2"], vec!["t3"]]);
    }

    #[test]
    fn fork_join_groups_siblings_into_one_level() {
        let nodes = vec![
            node("a", &[]),
            node("b", &["a"]),
            node("c", &["a"]),
            node("d", &["b", "c"]),
        ];
        let levels = compute_levels(&nodes).unwrap();
        assert_eq!(levels, vec![vec!["a"], vec!["b", "c"], vec!["d"]]);
    }

    #[test]
    fn cycle_is_rejected() {
        let nodes = vec![node("a", &["b"]), node("b", &["a"])];
        let err = compute_levels(&nodes).unwrap_err();
        assert!(matches!(err, OrchestratorError::CircularDependency { .. }));
    }

    #[test]
    fn null_schema_always_passes() {
        let nodes = vec![node("t1", &[])];
        assert!(check_schemas(&nodes).is_ok());
    }

    #[test]
    fn valid_schema_passes() {
        let mut n = node("t1", &[]);
        n.output_schema = serde_json::json!({"type": "object"});
        assert!(check_schemas(&[n]).is_ok());
    }

    #[test]
    fn malformed_schema_is_rejected() {
        let mut n = node("t1", &[]);
        n.input_schema = serde_json::json!({"pattern": "[unterminated"});
        let err = check_schemas(&[n]).unwrap_err();
        assert!(matches!(err, OrchestratorError::SchemaRejected { .. }));
    }

    #[test]
    fn every_node_appears_in_exactly_one_level() {
        let nodes = vec![
            node("a", &[]),
            node("b", &["a"]),
            node("c", &["a"]),
            node("d", &["b", "c"]),
            node("e", &[]),
        ];
        let levels = compute_levels(&nodes).unwrap();
        let mut seen: Vec<&String> = levels.iter().flatten().collect();
        seen.sort();
        let mut expected: Vec<&str> = vec!["a", "b", "c", "d", "e"];
        expected.sort();
        assert_eq!(seen, expected);
    }
}
