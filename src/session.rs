//! Interactive state for one loaded diagram.
//!
//! The layout is computed once when the session is created. From then on the
//! position map belongs to the session: drags and resizes mutate it in place
//! and nothing recomputes it unless [`DiagramSession::relayout`] is called.

use log::debug;
use thiserror::Error;

use crate::config::LayoutConfig;
use crate::ir::{Graph, resolve_parent};
use crate::layout::{Bounds, Position, PositionMap, compute_layout};

const ZOOM_STEP: f32 = 1.2;
const ZOOM_MIN: f32 = 0.3;
const ZOOM_MAX: f32 = 3.0;
const WHEEL_ZOOM_IN: f32 = 1.1;
const WHEEL_ZOOM_OUT: f32 = 0.9;
const WHEEL_SCALE_MIN: f32 = 0.1;
const FIT_PADDING: f32 = 200.0;
const MIN_NODE_EXTENT: f32 = 1.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no node with id '{0}' in this diagram")]
    UnknownNode(String),
}

/// Pan/zoom transform of the canvas: screen = world * scale + (x, y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    pub fn zoom_in(&mut self) {
        self.scale = (self.scale * ZOOM_STEP).min(ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.scale = (self.scale / ZOOM_STEP).max(ZOOM_MIN);
    }

    /// Wheel zoom anchored at a screen point, so the world point under the
    /// cursor stays put. Steps leaving `[0.1, 3]` are ignored.
    pub fn zoom_at(&mut self, anchor_x: f32, anchor_y: f32, wheel_delta: f32) {
        let factor = if wheel_delta > 0.0 {
            WHEEL_ZOOM_OUT
        } else {
            WHEEL_ZOOM_IN
        };
        let scale = self.scale * factor;
        if !(WHEEL_SCALE_MIN..=ZOOM_MAX).contains(&scale) {
            return;
        }
        self.x = anchor_x - (anchor_x - self.x) * factor;
        self.y = anchor_y - (anchor_y - self.y) * factor;
        self.scale = scale;
    }

    /// Centers `bounds` in a canvas of the given size, never zooming past 1.
    pub fn fit_to(&mut self, bounds: &Bounds, canvas_width: f32, canvas_height: f32) {
        let scale_x = canvas_width / (bounds.width() + FIT_PADDING);
        let scale_y = canvas_height / (bounds.height() + FIT_PADDING);
        let scale = scale_x.min(scale_y).min(1.0);
        if !scale.is_finite() || scale <= 0.0 {
            return;
        }
        self.scale = scale;
        self.x = (canvas_width - bounds.width() * scale) / 2.0 - bounds.min_x * scale;
        self.y = (canvas_height - bounds.height() * scale) / 2.0 - bounds.min_y * scale;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_world(&self, screen_x: f32, screen_y: f32) -> (f32, f32) {
        ((screen_x - self.x) / self.scale, (screen_y - self.y) / self.scale)
    }

    /// SVG `transform` attribute value for the diagram group.
    pub fn transform(&self) -> String {
        format!("translate({}, {}) scale({})", self.x, self.y, self.scale)
    }
}

#[derive(Debug, Clone)]
pub struct DiagramSession {
    graph: Graph,
    config: LayoutConfig,
    positions: PositionMap,
    pub viewport: Viewport,
}

impl DiagramSession {
    pub fn new(graph: Graph) -> Self {
        Self::with_config(graph, LayoutConfig::default())
    }

    pub fn with_config(graph: Graph, config: LayoutConfig) -> Self {
        let positions = compute_layout(&graph, &config);
        Self {
            graph,
            config,
            positions,
            viewport: Viewport::default(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn position(&self, id: &str) -> Option<&Position> {
        self.positions.get(id)
    }

    pub fn into_positions(self) -> PositionMap {
        self.positions
    }

    /// Translates a node by `(dx, dy)`. Moving a container carries its
    /// children along so they stay inside it.
    pub fn apply_node_move(&mut self, id: &str, dx: f32, dy: f32) -> Result<(), SessionError> {
        let is_container = self
            .positions
            .get(id)
            .ok_or_else(|| SessionError::UnknownNode(id.to_string()))?
            .is_container();

        let mut moved = vec![id.to_string()];
        if is_container {
            moved.extend(
                self.graph
                    .nodes
                    .iter()
                    .filter(|node| resolve_parent(&self.graph, node) == Some(id))
                    .map(|node| node.id.clone()),
            );
        }
        moved.sort();
        moved.dedup();
        for node_id in &moved {
            if let Some(pos) = self.positions.get_mut(node_id) {
                pos.translate(dx, dy);
            }
        }
        debug!("Moved {} node(s) by ({dx}, {dy}) starting at {id}", moved.len());
        Ok(())
    }

    /// Drag to an absolute top-left corner.
    pub fn move_node_to(&mut self, id: &str, x: f32, y: f32) -> Result<(), SessionError> {
        let (dx, dy) = {
            let pos = self
                .positions
                .get(id)
                .ok_or_else(|| SessionError::UnknownNode(id.to_string()))?;
            (x - pos.x, y - pos.y)
        };
        self.apply_node_move(id, dx, dy)
    }

    pub fn resize_node(&mut self, id: &str, width: f32, height: f32) -> Result<(), SessionError> {
        let pos = self
            .positions
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownNode(id.to_string()))?;
        pos.width = width.max(MIN_NODE_EXTENT);
        pos.height = height.max(MIN_NODE_EXTENT);
        Ok(())
    }

    /// Recomputes the layout from scratch, discarding every manual edit.
    pub fn relayout(&mut self) {
        self.positions = compute_layout(&self.graph, &self.config);
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(&self.positions)
    }

    pub fn fit_view(&mut self, canvas_width: f32, canvas_height: f32) {
        if let Some(bounds) = self.bounds() {
            self.viewport.fit_to(&bounds, canvas_width, canvas_height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Edge, Node};

    fn clustered() -> Graph {
        let mut graph = Graph::new();
        graph.push_node(Node::container("vpc", "VPC"));
        graph.push_node(Node::plain("web", "Web").with_parent("vpc"));
        graph.push_node(Node::plain("db", "DB").with_parent("vpc"));
        graph.push_node(Node::plain("user", "User"));
        graph.push_edge(Edge::new("e1", "user", "web"));
        graph
    }

    #[test]
    fn moving_a_node_only_touches_that_node() {
        let mut session = DiagramSession::new(clustered());
        let before = session.positions().clone();
        session.apply_node_move("web", 15.0, -5.0).unwrap();
        assert_eq!(session.position("web").unwrap().x, before["web"].x + 15.0);
        assert_eq!(session.position("web").unwrap().y, before["web"].y - 5.0);
        assert_eq!(session.position("db"), before.get("db"));
        assert_eq!(session.position("vpc"), before.get("vpc"));
    }

    #[test]
    fn moving_a_container_carries_children() {
        let mut session = DiagramSession::new(clustered());
        session.apply_node_move("vpc", 100.0, 40.0).unwrap();
        let frame = session.position("vpc").unwrap().clone();
        for child in ["web", "db"] {
            assert!(frame.contains(session.position(child).unwrap()));
        }
    }

    #[test]
    fn redefined_children_move_once() {
        let mut graph = clustered();
        graph.push_node(Node::plain("web", "Web twin").with_parent("vpc"));
        let mut session = DiagramSession::new(graph);
        let before = session.position("web").unwrap().clone();
        session.apply_node_move("vpc", 10.0, 0.0).unwrap();
        assert_eq!(session.position("web").unwrap().x, before.x + 10.0);
    }

    #[test]
    fn unknown_nodes_are_errors() {
        let mut session = DiagramSession::new(clustered());
        assert_eq!(
            session.apply_node_move("ghost", 1.0, 1.0),
            Err(SessionError::UnknownNode("ghost".into()))
        );
        assert!(session.resize_node("ghost", 10.0, 10.0).is_err());
    }

    #[test]
    fn drag_to_absolute_and_resize() {
        let mut session = DiagramSession::new(clustered());
        session.move_node_to("user", 900.0, 20.0).unwrap();
        session.resize_node("user", 120.0, -3.0).unwrap();
        let user = session.position("user").unwrap();
        assert_eq!((user.x, user.y), (900.0, 20.0));
        assert_eq!((user.width, user.height), (120.0, 1.0));
    }

    #[test]
    fn relayout_discards_manual_edits() {
        let mut session = DiagramSession::new(clustered());
        let original = session.positions().clone();
        session.apply_node_move("user", 500.0, 500.0).unwrap();
        assert_ne!(session.positions(), &original);
        session.relayout();
        assert_eq!(session.positions(), &original);
    }

    #[test]
    fn zoom_steps_are_clamped() {
        let mut viewport = Viewport::default();
        for _ in 0..20 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.scale, ZOOM_MAX);
        for _ in 0..40 {
            viewport.zoom_out();
        }
        assert_eq!(viewport.scale, ZOOM_MIN);
        viewport.reset();
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn wheel_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport {
            x: 40.0,
            y: -10.0,
            scale: 1.0,
        };
        let before = viewport.to_world(300.0, 200.0);
        viewport.zoom_at(300.0, 200.0, -1.0);
        let after = viewport.to_world(300.0, 200.0);
        assert!((viewport.scale - 1.1).abs() < 1e-6);
        assert!((before.0 - after.0).abs() < 1e-3);
        assert!((before.1 - after.1).abs() < 1e-3);
    }

    #[test]
    fn wheel_zoom_ignores_out_of_range_steps() {
        let mut viewport = Viewport {
            x: 0.0,
            y: 0.0,
            scale: 2.9,
        };
        viewport.zoom_at(0.0, 0.0, -1.0);
        assert_eq!(viewport.scale, 2.9);
    }

    #[test]
    fn fit_view_centers_the_diagram() {
        let mut session = DiagramSession::new(clustered());
        session.fit_view(1200.0, 800.0);
        let bounds = session.bounds().unwrap();
        let viewport = session.viewport;
        assert!(viewport.scale <= 1.0 && viewport.scale > 0.0);
        let left = bounds.min_x * viewport.scale + viewport.x;
        let right = bounds.max_x * viewport.scale + viewport.x;
        assert!((left - (1200.0 - right)).abs() < 1e-2);
        assert!(viewport.transform().starts_with("translate("));
    }
}
