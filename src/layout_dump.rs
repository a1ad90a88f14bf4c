use crate::ir::{Graph, GraphStats};
use crate::layout::{Bounds, PositionKind, PositionMap, Strategy, select_strategy};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub strategy: Strategy,
    pub stats: GraphStats,
    pub bounds: Option<Bounds>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub label: String,
    pub kind: PositionKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl LayoutDump {
    /// Nodes follow placement order; edges whose endpoints were not both
    /// placed are dropped here, as any renderer would.
    pub fn from_layout(graph: &Graph, positions: &PositionMap) -> Self {
        let nodes = positions
            .iter()
            .map(|(id, pos)| {
                let node = graph.node(id);
                NodeDump {
                    id: id.clone(),
                    label: node.map(|n| n.label.clone()).unwrap_or_else(|| id.clone()),
                    kind: pos.kind,
                    x: pos.x,
                    y: pos.y,
                    width: pos.width,
                    height: pos.height,
                    layer: pos.layer,
                    group: pos.group.clone(),
                    parent: graph.parent_of(id).map(str::to_string),
                }
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .filter(|edge| {
                positions.contains_key(edge.source.as_str())
                    && positions.contains_key(edge.target.as_str())
            })
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                label: edge.label.clone(),
            })
            .collect();

        LayoutDump {
            strategy: select_strategy(graph),
            stats: graph.stats(),
            bounds: Bounds::of(positions),
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, graph: &Graph, positions: &PositionMap) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(graph, positions);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
