use super::*;
use indexmap::IndexMap;

const DEFAULT_GROUP: &str = "default";

/// Adjacency restricted to edges whose endpoints both exist.
struct Adjacency<'a> {
    outgoing: HashMap<&'a str, Vec<&'a str>>,
    in_degree: HashMap<&'a str, usize>,
}

impl<'a> Adjacency<'a> {
    fn build(graph: &'a Graph, ids: &[&'a str]) -> Self {
        let known: HashSet<&str> = ids.iter().copied().collect();
        let mut outgoing: HashMap<&str, Vec<&str>> = ids.iter().map(|id| (*id, Vec::new())).collect();
        let mut in_degree: HashMap<&str, usize> = ids.iter().map(|id| (*id, 0)).collect();
        for edge in &graph.edges {
            let (source, target) = (edge.source.as_str(), edge.target.as_str());
            if !known.contains(source) || !known.contains(target) {
                continue;
            }
            outgoing.entry(source).or_default().push(target);
            *in_degree.entry(target).or_default() += 1;
        }
        Self { outgoing, in_degree }
    }

    fn out_degree(&self, id: &str) -> usize {
        self.outgoing.get(id).map(Vec::len).unwrap_or(0)
    }

    fn in_degree(&self, id: &str) -> usize {
        self.in_degree.get(id).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layering {
    pub layers: Vec<Vec<String>>,
    pub layer_of: HashMap<String, usize>,
}

fn roots_from<'a>(ids: &[&'a str], adjacency: &Adjacency<'a>, fallback_count: usize) -> Vec<&'a str> {
    let has_edges = ids.iter().any(|id| adjacency.out_degree(id) > 0);
    if has_edges {
        let roots: Vec<&str> = ids
            .iter()
            .copied()
            .filter(|id| adjacency.in_degree(id) == 0)
            .collect();
        if !roots.is_empty() {
            return roots;
        }
    }
    // Degenerate input (cycles only, or no usable edges): rank by fan-out.
    // The sort is stable, so ties keep input order.
    let mut ranked = ids.to_vec();
    ranked.sort_by_key(|id| std::cmp::Reverse(adjacency.out_degree(id)));
    ranked.truncate(fallback_count);
    ranked
}

/// Layer-0 nodes: every node without incoming edges, isolated ones included.
/// When no such node exists, or the graph has no usable edges at all, the
/// `fallback_count` nodes with the highest out-degree are used instead.
pub fn select_roots(graph: &Graph, fallback_count: usize) -> Vec<String> {
    let ids = unique_ids(graph);
    let adjacency = Adjacency::build(graph, &ids);
    roots_from(&ids, &adjacency, fallback_count)
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn layers_from<'a>(ids: &[&'a str], adjacency: &Adjacency<'a>, roots: &[&'a str]) -> Layering {
    let mut layering = Layering::default();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
    for root in roots {
        if visited.insert(*root) {
            queue.push_back((*root, 0));
        }
    }

    while let Some((id, layer)) = queue.pop_front() {
        if layering.layers.len() <= layer {
            layering.layers.resize_with(layer + 1, Vec::new);
        }
        layering.layers[layer].push(id.to_string());
        layering.layer_of.insert(id.to_string(), layer);
        if let Some(targets) = adjacency.outgoing.get(id) {
            for target in targets {
                // First visit wins; later paths never relayer a node.
                if visited.insert(*target) {
                    queue.push_back((*target, layer + 1));
                }
            }
        }
    }

    let unreached: Vec<&str> = ids.iter().copied().filter(|id| !visited.contains(id)).collect();
    if !unreached.is_empty() {
        let trailing = layering.layers.len();
        for id in &unreached {
            layering.layer_of.insert(id.to_string(), trailing);
        }
        layering
            .layers
            .push(unreached.into_iter().map(str::to_string).collect());
    }
    layering
}

/// Breadth-first layering from `roots`; every node the traversal never
/// reaches shares one extra layer after the last one.
pub fn assign_layers(graph: &Graph, roots: &[String]) -> Layering {
    let ids = unique_ids(graph);
    let adjacency = Adjacency::build(graph, &ids);
    let known: HashSet<&str> = ids.iter().copied().collect();
    let roots: Vec<&str> = roots
        .iter()
        .map(String::as_str)
        .filter(|id| known.contains(id))
        .collect();
    layers_from(&ids, &adjacency, &roots)
}

fn group_key<'a>(node: Option<&'a Node>, by_subtitle: bool) -> &'a str {
    node.and_then(|node| {
        node.group
            .as_deref()
            .or_else(|| if by_subtitle { node.subtitle.as_deref() } else { None })
    })
    .unwrap_or(DEFAULT_GROUP)
}

/// Reorders each layer so nodes sharing a group are adjacent. Buckets keep
/// first-seen order, and so do nodes inside a bucket.
pub fn group_layers(layering: &mut Layering, graph: &Graph, by_subtitle: bool) {
    let mut by_id: HashMap<&str, &Node> = HashMap::new();
    for node in &graph.nodes {
        by_id.entry(node.id.as_str()).or_insert(node);
    }
    for layer in &mut layering.layers {
        let mut buckets: IndexMap<&str, Vec<String>> = IndexMap::new();
        for id in layer.drain(..) {
            let key = group_key(by_id.get(id.as_str()).copied(), by_subtitle);
            buckets.entry(key).or_default().push(id);
        }
        *layer = buckets.into_values().flatten().collect();
    }
}

pub(super) fn compute_hierarchical_layout(graph: &Graph, config: &LayoutConfig) -> PositionMap {
    let cfg = &config.hierarchical;
    let ids = unique_ids(graph);
    let adjacency = Adjacency::build(graph, &ids);
    let roots = roots_from(&ids, &adjacency, cfg.fallback_root_count);
    let mut layering = layers_from(&ids, &adjacency, &roots);
    debug!(
        "Layered {} nodes into {} layers from {} roots",
        ids.len(),
        layering.layers.len(),
        roots.len()
    );
    group_layers(&mut layering, graph, cfg.group_by_subtitle);

    let by_id: HashMap<&str, &Node> = graph
        .nodes
        .iter()
        .rev()
        .map(|node| (node.id.as_str(), node))
        .collect();
    let mut positions = PositionMap::new();
    for (layer_idx, layer) in layering.layers.iter().enumerate() {
        let y = cfg.base_y + layer_idx as f32 * cfg.layer_spacing;
        for (idx, id) in layer.iter().enumerate() {
            let node = by_id.get(id.as_str()).copied();
            let group = node.and_then(|node| {
                node.group.clone().or_else(|| {
                    if cfg.group_by_subtitle {
                        node.subtitle.clone()
                    } else {
                        None
                    }
                })
            });
            positions.insert(
                id.clone(),
                Position {
                    layer: Some(layer_idx),
                    group,
                    ..Position::plain(
                        cfg.base_x + idx as f32 * cfg.node_spacing,
                        y,
                        config.node_width,
                        config.node_height,
                    )
                },
            );
        }
    }

    let report = resolve_collisions(&mut positions, &config.collision);
    if !report.converged {
        debug!(
            "Collision pass stopped after {} passes with {} pairs still too close",
            report.passes, report.residual_pairs
        );
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Edge;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for id in nodes {
            graph.push_node(Node::plain(*id, *id));
        }
        for (idx, (from, to)) in edges.iter().enumerate() {
            graph.push_edge(Edge::new(format!("e{idx}"), *from, *to));
        }
        graph
    }

    #[test]
    fn roots_are_sources() {
        let g = graph(&["a", "b", "c", "d"], &[("a", "b"), ("c", "b"), ("b", "d")]);
        assert_eq!(select_roots(&g, 3), vec!["a", "c"]);
    }

    #[test]
    fn cyclic_graph_falls_back_to_out_degree() {
        let g = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d"), ("d", "c"), ("d", "a")],
        );
        // out-degrees: a=1, b=1, c=2, d=2
        assert_eq!(select_roots(&g, 3), vec!["c", "d", "a"]);
    }

    #[test]
    fn edgeless_graph_takes_first_three_in_input_order() {
        let g = graph(&["n1", "n2", "n3", "n4"], &[]);
        assert_eq!(select_roots(&g, 3), vec!["n1", "n2", "n3"]);
        let layering = assign_layers(&g, &select_roots(&g, 3));
        assert_eq!(layering.layers, vec![vec!["n1", "n2", "n3"], vec!["n4"]]);
        assert_eq!(layering.layer_of["n4"], 1);
    }

    #[test]
    fn first_visit_wins() {
        // a -> b -> c and a -> c: c is reached at layer 1 directly.
        let g = graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "d"), ("a", "c"), ("c", "d")]);
        let layering = assign_layers(&g, &select_roots(&g, 3));
        assert_eq!(layering.layer_of["a"], 0);
        assert_eq!(layering.layer_of["b"], 1);
        assert_eq!(layering.layer_of["c"], 1);
        assert_eq!(layering.layer_of["d"], 2);
    }

    #[test]
    fn isolated_nodes_are_roots_next_to_sources() {
        let g = graph(&["A", "B", "C"], &[("A", "B")]);
        assert_eq!(select_roots(&g, 3), vec!["A", "C"]);
        let layout = compute_hierarchical_layout(&g, &LayoutConfig::default());
        assert_eq!(layout["A"].layer, Some(0));
        assert_eq!(layout["B"].layer, Some(1));
        assert_eq!(layout["C"].layer, Some(0));
        assert_eq!(layout["C"].y, layout["A"].y);
    }

    #[test]
    fn dangling_edges_alone_use_the_fallback() {
        let g = graph(&["n1", "n2", "n3", "n4"], &[("n1", "ghost")]);
        assert_eq!(select_roots(&g, 3), vec!["n1", "n2", "n3"]);
    }

    #[test]
    fn unreached_nodes_share_one_trailing_layer() {
        // x and y only feed each other, so no root reaches them.
        let g = graph(&["a", "b", "x", "y"], &[("a", "b"), ("x", "y"), ("y", "x")]);
        let layering = assign_layers(&g, &select_roots(&g, 3));
        assert_eq!(layering.layers.len(), 3);
        assert_eq!(layering.layers[2], vec!["x", "y"]);
    }

    #[test]
    fn reached_nodes_hang_one_layer_below_a_predecessor() {
        let g = graph(
            &["r", "a", "b", "c", "d", "lone"],
            &[("r", "a"), ("r", "b"), ("a", "c"), ("b", "c"), ("c", "d"), ("d", "a")],
        );
        let roots = select_roots(&g, 3);
        let layering = assign_layers(&g, &roots);
        for (id, layer) in &layering.layer_of {
            if roots.contains(id) {
                assert_eq!(*layer, 0);
                continue;
            }
            let has_parent = g.edges.iter().any(|edge| {
                &edge.target == id && layering.layer_of.get(&edge.source) == Some(&(layer - 1))
            });
            assert!(has_parent, "{id} at layer {layer} has no predecessor one layer up");
        }
    }

    #[test]
    fn unknown_roots_are_ignored() {
        let g = graph(&["a", "b"], &[("a", "b")]);
        let layering = assign_layers(&g, &["ghost".to_string(), "a".to_string()]);
        assert_eq!(layering.layers, vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn grouping_keeps_first_seen_bucket_order() {
        let mut g = Graph::new();
        g.push_node(Node::plain("root", "root"));
        g.push_node(Node::plain("a1", "a1").with_group("api"));
        g.push_node(Node::plain("d1", "d1").with_group("data"));
        g.push_node(Node::plain("a2", "a2").with_group("api"));
        g.push_node(Node::plain("x", "x"));
        g.push_node(Node::plain("d2", "d2").with_group("data"));
        for (idx, target) in ["a1", "d1", "a2", "x", "d2"].iter().enumerate() {
            g.push_edge(Edge::new(format!("e{idx}"), "root", *target));
        }
        let mut layering = assign_layers(&g, &select_roots(&g, 3));
        group_layers(&mut layering, &g, false);
        assert_eq!(layering.layers[1], vec!["a1", "a2", "d1", "d2", "x"]);
    }

    #[test]
    fn subtitle_grouping_is_opt_in() {
        let mut g = Graph::new();
        g.push_node(Node::plain("p", "p"));
        g.push_node(Node::plain("a", "a").with_subtitle("billing"));
        g.push_node(Node::plain("b", "b"));
        g.push_node(Node::plain("c", "c").with_subtitle("billing"));
        for (idx, target) in ["a", "b", "c"].iter().enumerate() {
            g.push_edge(Edge::new(format!("e{idx}"), "p", *target));
        }
        let base = assign_layers(&g, &select_roots(&g, 3));

        let mut plain = base.clone();
        group_layers(&mut plain, &g, false);
        assert_eq!(plain.layers[1], vec!["a", "b", "c"]);

        let mut by_subtitle = base;
        group_layers(&mut by_subtitle, &g, true);
        assert_eq!(by_subtitle.layers[1], vec!["a", "c", "b"]);
    }

    #[test]
    fn coordinates_follow_layer_and_index() {
        let config = LayoutConfig::default();
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("a", "c")]);
        let layout = compute_hierarchical_layout(&g, &config);
        let cfg = &config.hierarchical;
        assert_eq!(layout["a"].x, cfg.base_x);
        assert_eq!(layout["a"].y, cfg.base_y);
        assert_eq!(layout["c"].x, cfg.base_x + cfg.node_spacing);
        assert_eq!(layout["c"].y, cfg.base_y + cfg.layer_spacing);
        assert_eq!(layout["b"].width, config.node_width);
    }

    #[test]
    fn tight_spacing_triggers_collision_relaxation() {
        let mut config = LayoutConfig::default();
        config.hierarchical.node_spacing = 40.0;
        let g = graph(&["r", "a", "b"], &[("r", "a"), ("r", "b")]);
        let layout = compute_hierarchical_layout(&g, &config);
        let (ax, ay) = layout["a"].center();
        let (bx, by) = layout["b"].center();
        let distance = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
        assert!(distance >= config.collision.min_distance - 0.01);
    }

    #[test]
    fn self_loops_do_not_make_roots() {
        let g = graph(&["a", "b"], &[("a", "a"), ("a", "b")]);
        // a has an incoming self edge, so no source exists; fallback ranks a first.
        assert_eq!(select_roots(&g, 3), vec!["a", "b"]);
        let layering = assign_layers(&g, &select_roots(&g, 1));
        assert_eq!(layering.layer_of["b"], 1);
    }
}
