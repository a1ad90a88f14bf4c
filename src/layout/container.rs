use super::*;
use crate::config::ContainerLayoutConfig;
use crate::ir::LayoutHint;
use text::{estimate_text_width, text_lines};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum GridShape {
    SingleRow { cols: usize },
    Grid { cols: usize, rows: usize },
}

impl GridShape {
    fn cols(self) -> usize {
        match self {
            GridShape::SingleRow { cols } | GridShape::Grid { cols, .. } => cols,
        }
    }

    fn rows(self) -> usize {
        match self {
            GridShape::SingleRow { .. } => 1,
            GridShape::Grid { rows, .. } => rows,
        }
    }
}

/// Row when explicitly hinted or small enough, otherwise a near-square grid
/// capped at `max_grid_columns`.
pub(super) fn select_grid_shape(
    hint: Option<LayoutHint>,
    child_count: usize,
    config: &ContainerLayoutConfig,
) -> GridShape {
    if hint == Some(LayoutHint::Row) || child_count <= config.single_row_threshold {
        return GridShape::SingleRow { cols: child_count };
    }
    let sqrt = (child_count as f64).sqrt().ceil() as usize;
    let cols = sqrt.min(config.max_grid_columns).max(1);
    GridShape::Grid {
        cols,
        rows: child_count.div_ceil(cols),
    }
}

#[derive(Debug, Clone, Copy)]
struct ContainerFrame {
    shape: GridShape,
    width: f32,
    height: f32,
    header_height: f32,
    row_pitch: f32,
}

fn header_height(container: &Node, config: &LayoutConfig) -> f32 {
    let cfg = &config.container;
    let label_lines = text_lines(&container.label, &config.text) as f32;
    let subtitle_lines = container
        .subtitle
        .as_deref()
        .map(|subtitle| text_lines(subtitle, &config.text) as f32)
        .unwrap_or(0.0);
    cfg.header_base + label_lines * cfg.label_line_height + subtitle_lines * cfg.subtitle_line_height
}

fn measure_container(container: &Node, children: &[&Node], config: &LayoutConfig) -> ContainerFrame {
    let cfg = &config.container;
    let shape = select_grid_shape(container.layout_hint(), children.len(), cfg);
    let cols = shape.cols();
    let rows = shape.rows();
    let header = header_height(container, config);

    // One pitch for the whole container so every row stays aligned.
    let wraps = children
        .iter()
        .any(|child| text_lines(&child.label, &config.text) > 1);
    let row_pitch = if wraps {
        cfg.row_pitch + cfg.wrapped_label_extra
    } else {
        cfg.row_pitch
    };

    let label_width = estimate_text_width(
        &container.label,
        config.text.container_label_font_size,
        &config.text,
    );
    let content_width = if cols == 0 {
        0.0
    } else {
        cfg.child_inset_x * 2.0 + (cols - 1) as f32 * cfg.cell_width + config.node_width
    };
    let mut width = (cols as f32 * cfg.cell_width + cfg.width_padding)
        .max(label_width + cfg.label_padding)
        .max(content_width);

    let content_height = header
        + cfg.child_top_gap
        + (rows.max(1) - 1) as f32 * row_pitch
        + config.node_height
        + cfg.child_bottom_pad;
    let mut height = content_height.max(cfg.min_height);

    match shape {
        GridShape::SingleRow { .. } => {
            width = width.max(cfg.min_width);
        }
        GridShape::Grid { rows, .. } => {
            let grid_height = rows as f32 * cfg.cell_height;
            height = height
                .max(grid_height + cfg.height_padding)
                .max(header + grid_height);
        }
    }

    ContainerFrame {
        shape,
        width,
        height,
        header_height: header,
        row_pitch,
    }
}

pub(super) fn compute_container_layout(graph: &Graph, config: &LayoutConfig) -> PositionMap {
    let cfg = &config.container;
    let mut positions = PositionMap::new();
    let nodes = unique_nodes(graph);
    let parents: Vec<Option<&str>> = nodes
        .iter()
        .map(|node| resolve_parent(graph, node))
        .collect();

    let mut cursor_y = cfg.margin_top;
    for container in nodes.iter().filter(|node| node.is_container()) {
        let children: Vec<&Node> = nodes
            .iter()
            .copied()
            .zip(&parents)
            .filter(|(_, parent)| **parent == Some(container.id.as_str()))
            .map(|(node, _)| node)
            .collect();
        let frame = measure_container(container, &children, config);
        debug!(
            "Container {} holds {} children as {:?}: {}x{}",
            container.id,
            children.len(),
            frame.shape,
            frame.width,
            frame.height
        );

        let x = cfg.margin_x;
        let y = cursor_y;
        positions.insert(
            container.id.clone(),
            Position {
                group: container.group.clone(),
                ..Position::container(x, y, frame.width, frame.height)
            },
        );

        let cols = frame.shape.cols().max(1);
        for (idx, child) in children.iter().enumerate() {
            let col = idx % cols;
            let row = idx / cols;
            positions.insert(
                child.id.clone(),
                Position {
                    group: child.group.clone(),
                    ..Position::plain(
                        x + cfg.child_inset_x + col as f32 * cfg.cell_width,
                        y + frame.header_height + cfg.child_top_gap + row as f32 * frame.row_pitch,
                        config.node_width,
                        config.node_height,
                    )
                },
            );
        }

        cursor_y += frame.height + cfg.container_gap;
    }

    let orphans = nodes
        .iter()
        .copied()
        .zip(&parents)
        .filter(|(node, parent)| !node.is_container() && parent.is_none())
        .map(|(node, _)| node);
    let orphan_cols = cfg.orphan_columns.max(1);
    for (idx, node) in orphans.enumerate() {
        let col = idx % orphan_cols;
        let row = idx / orphan_cols;
        if node.parent.is_some() {
            debug!(
                "Node {} has an unusable parent reference; placing it as an orphan",
                node.id
            );
        }
        positions.insert(
            node.id.clone(),
            Position {
                group: node.group.clone(),
                ..Position::plain(
                    cfg.margin_x + col as f32 * cfg.orphan_spacing_x,
                    cursor_y + row as f32 * cfg.orphan_spacing_y,
                    config.node_width,
                    config.node_height,
                )
            },
        );
    }

    positions
}
