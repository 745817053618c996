// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::errors::{DeployError, Result};
use crate::types::{Contract, DependencyMap, DependencyPolicy};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct prerequisites, deduplicated, unknown names already removed.
    deps: Vec<String>,
    /// Direct dependents: contracts that list this one as a prerequisite.
    dependents: Vec<String>,
}

/// Validated dependency graph of a deployment batch, keyed by contract name.
///
/// Construction is the only place where input errors are raised; once a
/// `DagGraph` exists, every prerequisite name refers to a known node and the
/// graph is acyclic.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: HashMap<String, DagNode>,
    /// Contract names in the order the caller supplied them.
    order: Vec<String>,
}

impl DagGraph {
    /// Build the graph from the caller's contract list and dependency map.
    ///
    /// Errors:
    /// - two contracts share a name
    /// - a prerequisite is unknown and `policy` is [`DependencyPolicy::Strict`]
    /// - the map contains a cycle (including a contract depending on itself)
    pub fn build(
        contracts: &[Contract],
        dependencies: &DependencyMap,
        policy: DependencyPolicy,
    ) -> Result<Self> {
        let mut nodes: HashMap<String, DagNode> = HashMap::new();
        let mut order = Vec::with_capacity(contracts.len());

        for contract in contracts {
            if nodes.contains_key(&contract.name) {
                return Err(DeployError::DuplicateContract(contract.name.clone()));
            }
            nodes.insert(contract.name.clone(), DagNode::default());
            order.push(contract.name.clone());
        }

        for name in &order {
            let Some(raw_deps) = dependencies.get(name) else {
                continue;
            };

            let mut seen = HashSet::new();
            let mut deps = Vec::new();
            for dep in raw_deps {
                if dep == name {
                    return Err(DeployError::DagCycle(format!(
                        "contract '{name}' cannot depend on itself"
                    )));
                }
                if !nodes.contains_key(dep) {
                    match policy {
                        DependencyPolicy::Strict => {
                            return Err(DeployError::UnknownDependency {
                                contract: name.clone(),
                                dependency: dep.clone(),
                            });
                        }
                        DependencyPolicy::Lenient => {
                            warn!(
                                contract = %name,
                                dependency = %dep,
                                "unknown dependency; treating it as already satisfied"
                            );
                            continue;
                        }
                    }
                }
                if seen.insert(dep.as_str()) {
                    deps.push(dep.clone());
                }
            }

            if let Some(node) = nodes.get_mut(name) {
                node.deps = deps;
            }
        }

        for key in dependencies.keys() {
            if !nodes.contains_key(key) {
                debug!(contract = %key, "dependency map entry for unknown contract; ignoring");
            }
        }

        // Second pass: populate dependents based on deps.
        for name in &order {
            let deps = nodes.get(name).map(|n| n.deps.clone()).unwrap_or_default();
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        let graph = Self { nodes, order };
        graph.ensure_acyclic()?;
        Ok(graph)
    }

    fn ensure_acyclic(&self) -> Result<()> {
        // Edge direction: dep -> contract.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in &self.order {
            graph.add_node(name.as_str());
        }
        for name in &self.order {
            for dep in self.dependencies_of(name) {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(DeployError::DagCycle(format!(
                "cycle detected in contract dependencies involving '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// All contract names, in the order the caller supplied them.
    pub fn contracts(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Immediate prerequisites of a contract.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a contract.
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Group contracts into levels where every contract only depends on
    /// contracts from earlier levels. Names inside a level are sorted.
    pub fn execution_levels(&self) -> Vec<Vec<String>> {
        let mut remaining: HashMap<&str, usize> = self
            .order
            .iter()
            .map(|name| (name.as_str(), self.dependencies_of(name).len()))
            .collect();

        let mut levels = Vec::new();
        let mut current: Vec<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();

        while !current.is_empty() {
            current.sort_unstable();
            let mut next = Vec::new();
            for name in &current {
                remaining.remove(name);
                for dependent in self.dependents_of(name) {
                    if let Some(count) = remaining.get_mut(dependent.as_str()) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(dependent.as_str());
                        }
                    }
                }
            }
            levels.push(current.iter().map(|s| s.to_string()).collect());
            current = next;
        }

        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contracts(names: &[&str]) -> Vec<Contract> {
        names.iter().map(|n| Contract::new(*n)).collect()
    }

    fn deps(pairs: &[(&str, &[&str])]) -> DependencyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn builds_dependents_and_dedups_prerequisites() {
        let graph = DagGraph::build(
            &contracts(&["A", "B", "C"]),
            &deps(&[("B", &["A", "A"]), ("C", &["A", "B"])]),
            DependencyPolicy::Lenient,
        )
        .unwrap();

        assert_eq!(graph.dependencies_of("B"), ["A".to_string()]);
        assert_eq!(graph.dependencies_of("A"), Vec::<String>::new().as_slice());
        let mut dependents = graph.dependents_of("A").to_vec();
        dependents.sort();
        assert_eq!(dependents, vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn lenient_policy_drops_unknown_prerequisites() {
        let graph = DagGraph::build(
            &contracts(&["A"]),
            &deps(&[("A", &["Ghost"])]),
            DependencyPolicy::Lenient,
        )
        .unwrap();
        assert!(graph.dependencies_of("A").is_empty());
    }

    #[test]
    fn strict_policy_rejects_unknown_prerequisites() {
        let err = DagGraph::build(
            &contracts(&["A"]),
            &deps(&[("A", &["Ghost"])]),
            DependencyPolicy::Strict,
        )
        .unwrap_err();
        match err {
            DeployError::UnknownDependency { contract, dependency } => {
                assert_eq!(contract, "A");
                assert_eq!(dependency, "Ghost");
            }
            other => panic!("expected UnknownDependency, got {other:?}"),
        }
    }

    #[test]
    fn two_node_cycle_is_rejected() {
        let err = DagGraph::build(
            &contracts(&["A", "B"]),
            &deps(&[("A", &["B"]), ("B", &["A"])]),
            DependencyPolicy::Lenient,
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::DagCycle(_)));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let err = DagGraph::build(
            &contracts(&["A"]),
            &deps(&[("A", &["A"])]),
            DependencyPolicy::Lenient,
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::DagCycle(msg) if msg.contains("itself")));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = DagGraph::build(
            &contracts(&["A", "A"]),
            &DependencyMap::new(),
            DependencyPolicy::Lenient,
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::DuplicateContract(name) if name == "A"));
    }

    #[test]
    fn execution_levels_follow_dependencies() {
        let graph = DagGraph::build(
            &contracts(&["D", "C", "B", "A"]),
            &deps(&[("B", &["A"]), ("C", &["A"]), ("D", &["B", "C"])]),
            DependencyPolicy::Lenient,
        )
        .unwrap();

        assert_eq!(
            graph.execution_levels(),
            vec![
                vec!["A".to_string()],
                vec!["B".to_string(), "C".to_string()],
                vec!["D".to_string()],
            ]
        );
    }
}
