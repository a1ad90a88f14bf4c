//! Non-fatal checks over a parsed graph.
//!
//! Layout never fails on these: each issue maps to a fallback the engine
//! already applies (orphan placement, skipped edge, first definition wins).
//! They exist so callers can surface what was silently repaired.

use std::collections::HashSet;

use thiserror::Error;

use crate::ir::{Graph, parent_cycle};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphIssue {
    #[error("node '{id}' is defined more than once; the first definition is used")]
    DuplicateNode { id: String },

    #[error("node '{node}' references missing parent '{parent}'; placed as an orphan")]
    MissingParent { node: String, parent: String },

    #[error("node '{node}' references '{parent}', which is not a container; placed as an orphan")]
    ParentNotContainer { node: String, parent: String },

    #[error("container '{node}' is nested in '{parent}'; containers are stacked at the top level")]
    NestedContainer { node: String, parent: String },

    #[error("parent references form a cycle: {}", cycle.join(" -> "))]
    ParentCycle { cycle: Vec<String> },

    #[error("edge '{edge}' references missing node '{endpoint}' and will not be drawn")]
    DanglingEdge { edge: String, endpoint: String },

    #[error("edge '{edge}' connects '{node}' to itself")]
    SelfLoop { edge: String, node: String },
}

pub fn check_graph(graph: &Graph) -> Vec<GraphIssue> {
    let mut issues = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for node in &graph.nodes {
        if !seen.insert(node.id.as_str()) {
            issues.push(GraphIssue::DuplicateNode {
                id: node.id.clone(),
            });
        }
    }

    let mut reported_cycles: HashSet<Vec<String>> = HashSet::new();
    for node in &graph.nodes {
        let Some(parent_id) = node.parent.as_deref() else {
            continue;
        };
        match graph.node(parent_id) {
            None => issues.push(GraphIssue::MissingParent {
                node: node.id.clone(),
                parent: parent_id.to_string(),
            }),
            Some(parent) if !parent.is_container() => {
                issues.push(GraphIssue::ParentNotContainer {
                    node: node.id.clone(),
                    parent: parent_id.to_string(),
                })
            }
            Some(_) if node.is_container() => issues.push(GraphIssue::NestedContainer {
                node: node.id.clone(),
                parent: parent_id.to_string(),
            }),
            Some(_) => {}
        }

        if let Some(cycle) = parent_cycle(graph, &node.id) {
            let mut key = cycle[..cycle.len() - 1].to_vec();
            key.sort();
            if reported_cycles.insert(key) {
                issues.push(GraphIssue::ParentCycle { cycle });
            }
        }
    }

    for edge in &graph.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !seen.contains(endpoint.as_str()) {
                issues.push(GraphIssue::DanglingEdge {
                    edge: edge.id.clone(),
                    endpoint: endpoint.clone(),
                });
            }
        }
        if edge.source == edge.target && seen.contains(edge.source.as_str()) {
            issues.push(GraphIssue::SelfLoop {
                edge: edge.id.clone(),
                node: edge.source.clone(),
            });
        }
    }

    issues
}
