use crate::ir::{Edge, Graph, LayoutHint, Node, NodeKind};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

static FENCED_JSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json5?|JSON)?\s*(\{.*\})\s*```").unwrap());

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("diagram input is empty")]
    Empty,
    #[error("diagram input is not valid JSON: {message}")]
    Json { message: String },
    #[error("diagram input must be an object with `nodes` and `edges` arrays")]
    NotAnObject,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDiagram {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<RawEdge>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: Option<RawId>,
    #[serde(rename = "type")]
    kind: Option<String>,
    label: Option<String>,
    subtitle: Option<String>,
    group: Option<String>,
    #[serde(alias = "parentNode", alias = "parent")]
    parent_id: Option<RawId>,
    #[serde(alias = "layout")]
    layout_hint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEdge {
    id: Option<RawId>,
    #[serde(alias = "from")]
    source: Option<RawId>,
    #[serde(alias = "to")]
    target: Option<RawId>,
    label: Option<String>,
}

/// Ids are strings in practice, but generated documents occasionally use
/// bare numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

/// Returns the JSON object inside a fenced code block, or the trimmed input
/// when no fence is present.
pub fn extract_json_payload(input: &str) -> &str {
    FENCED_JSON_RE
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str())
        .unwrap_or_else(|| input.trim())
}

pub fn parse_diagram(input: &str) -> Result<Graph, ParseError> {
    let payload = extract_json_payload(input);
    if payload.is_empty() {
        return Err(ParseError::Empty);
    }
    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(json_err) => json5::from_str(payload).map_err(|_| ParseError::Json {
            message: json_err.to_string(),
        })?,
    };
    if !value.is_object() {
        return Err(ParseError::NotAnObject);
    }
    let raw: RawDiagram = serde_json::from_value(value).map_err(|err| ParseError::Json {
        message: err.to_string(),
    })?;
    Ok(normalize(raw))
}

fn normalize(raw: RawDiagram) -> Graph {
    let mut graph = Graph::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, node) in raw.nodes.into_iter().enumerate() {
        let id = node
            .id
            .map(RawId::into_string)
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("node-{idx}"));
        if !seen.insert(id.clone()) {
            warn!("Duplicate node id {id}; keeping the first definition");
            continue;
        }
        let is_container = node
            .kind
            .as_deref()
            .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("container"));
        let kind = if is_container {
            NodeKind::Container {
                layout_hint: node.layout_hint.as_deref().and_then(LayoutHint::from_token),
            }
        } else {
            if node.layout_hint.is_some() {
                debug!("Ignoring layout hint on plain node {id}");
            }
            NodeKind::Plain
        };
        let label = node
            .label
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| id.clone());
        graph.push_node(Node {
            id,
            label,
            subtitle: node.subtitle.filter(|s| !s.trim().is_empty()),
            group: node.group.filter(|g| !g.trim().is_empty()),
            parent: node
                .parent_id
                .map(RawId::into_string)
                .filter(|p| !p.trim().is_empty()),
            kind,
        });
    }

    for (idx, edge) in raw.edges.into_iter().enumerate() {
        let (Some(source), Some(target)) = (edge.source, edge.target) else {
            debug!("Skipping edge #{idx} without both endpoints");
            continue;
        };
        graph.push_edge(Edge {
            id: edge
                .id
                .map(RawId::into_string)
                .unwrap_or_else(|| format!("edge-{idx}")),
            source: source.into_string(),
            target: target.into_string(),
            label: edge.label.filter(|l| !l.trim().is_empty()),
        });
    }

    graph
}
