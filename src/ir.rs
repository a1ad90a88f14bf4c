use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutHint {
    Row,
    Grid,
}

impl LayoutHint {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "row" => Some(Self::Row),
            "grid" => Some(Self::Grid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Groups other nodes; sized from its children once they are laid out.
    Container { layout_hint: Option<LayoutHint> },
    Plain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub subtitle: Option<String>,
    pub group: Option<String>,
    pub parent: Option<String>,
    pub kind: NodeKind,
}

impl Node {
    pub fn plain(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            subtitle: None,
            group: None,
            parent: None,
            kind: NodeKind::Plain,
        }
    }

    pub fn container(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Container { layout_hint: None },
            ..Self::plain(id, label)
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Only meaningful for containers; plain nodes ignore the hint.
    pub fn with_layout_hint(mut self, hint: LayoutHint) -> Self {
        if let NodeKind::Container { layout_hint } = &mut self.kind {
            *layout_hint = Some(hint);
        }
        self
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container { .. })
    }

    pub fn layout_hint(&self) -> Option<LayoutHint> {
        match self.kind {
            NodeKind::Container { layout_hint } => layout_hint,
            NodeKind::Plain => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub containers: usize,
}

/// Immutable description of one diagram. Input order is significant: the
/// layout strategies are order-preserving.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn is_container(&self, id: &str) -> bool {
        self.node(id).is_some_and(Node::is_container)
    }

    pub fn has_containers(&self) -> bool {
        self.nodes.iter().any(Node::is_container)
    }

    pub fn containers(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.is_container())
    }

    /// Direct children of `container_id`, in input order.
    pub fn children_of<'a>(&'a self, container_id: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes
            .iter()
            .filter(move |node| resolve_parent(self, node) == Some(container_id))
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.node(id).and_then(|node| resolve_parent(self, node))
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.edges
            .iter()
            .filter(|edge| edge.target == id && self.contains_node(&edge.source))
            .count()
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.edges
            .iter()
            .filter(|edge| edge.source == id && self.contains_node(&edge.target))
            .count()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            containers: self.containers().count(),
        }
    }
}

/// Parent used for placement. A node only has a parent when its reference
/// names an existing container other than itself; containers are always
/// placed top-level. Everything else falls back to `None` (orphan).
pub fn resolve_parent<'a>(graph: &'a Graph, node: &Node) -> Option<&'a str> {
    if node.is_container() {
        return None;
    }
    let parent_id = node.parent.as_deref()?;
    if parent_id == node.id {
        return None;
    }
    graph
        .node(parent_id)
        .filter(|parent| parent.is_container())
        .map(|parent| parent.id.as_str())
}

/// Follows raw `parent` references starting at `id`. Returns the ids forming
/// the cycle (first repeated id last) when the chain loops back on itself.
pub fn parent_cycle(graph: &Graph, id: &str) -> Option<Vec<String>> {
    let mut chain: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = graph.node(id)?;
    loop {
        if !seen.insert(current.id.as_str()) {
            let start = chain.iter().position(|entry| entry == &current.id)?;
            let mut cycle = chain[start..].to_vec();
            cycle.push(current.id.clone());
            return Some(cycle);
        }
        chain.push(current.id.clone());
        let parent_id = current.parent.as_deref()?;
        current = graph.node(parent_id)?;
    }
}
