mod collision;
mod container;
mod hierarchical;
pub(crate) mod text;
pub(crate) mod types;
pub use collision::{CollisionReport, resolve_collisions};
pub use hierarchical::{Layering, assign_layers, group_layers, select_roots};
pub use types::*;
use container::*;
use hierarchical::*;

use crate::config::LayoutConfig;
use crate::ir::{Graph, Node, resolve_parent};
use log::debug;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Container,
    Hierarchical,
}

/// Any container anywhere in the graph switches the whole diagram to the
/// container strategy.
pub fn select_strategy(graph: &Graph) -> Strategy {
    if graph.has_containers() {
        Strategy::Container
    } else {
        Strategy::Hierarchical
    }
}

pub fn calculate_layout(graph: &Graph) -> PositionMap {
    compute_layout(graph, &LayoutConfig::default())
}

pub fn compute_layout(graph: &Graph, config: &LayoutConfig) -> PositionMap {
    if graph.nodes.is_empty() {
        return PositionMap::new();
    }
    let strategy = select_strategy(graph);
    debug!(
        "Computing {:?} layout for {} nodes and {} edges",
        strategy,
        graph.nodes.len(),
        graph.edges.len()
    );
    let positions = match strategy {
        Strategy::Container => compute_container_layout(graph, config),
        Strategy::Hierarchical => compute_hierarchical_layout(graph, config),
    };
    debug!("Layout produced {} positions", positions.len());
    positions
}

/// Nodes in input order with later redefinitions of an id dropped.
fn unique_nodes(graph: &Graph) -> Vec<&Node> {
    let mut seen = HashSet::new();
    graph
        .nodes
        .iter()
        .filter(|node| seen.insert(node.id.as_str()))
        .collect()
}

fn unique_ids(graph: &Graph) -> Vec<&str> {
    unique_nodes(graph)
        .into_iter()
        .map(|node| node.id.as_str())
        .collect()
}
