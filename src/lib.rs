#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod session;

#[cfg(feature = "cli")]
pub use cli::{Args, run};
pub use config::{Config, LayoutConfig, load_config, parse_config};
pub use diagnostics::{GraphIssue, check_graph};
pub use ir::{Edge, Graph, LayoutHint, Node, NodeKind};
pub use layout::{Bounds, Position, PositionKind, PositionMap, calculate_layout, compute_layout};
pub use layout_dump::LayoutDump;
pub use parser::{ParseError, parse_diagram};
pub use session::{DiagramSession, SessionError, Viewport};

/// Parses a diagram document and lays it out in one step.
pub fn layout_from_json(input: &str, config: &LayoutConfig) -> Result<PositionMap, ParseError> {
    let graph = parse_diagram(input)?;
    Ok(compute_layout(&graph, config))
}
