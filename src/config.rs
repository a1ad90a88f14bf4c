use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    pub words_per_line: usize,
    pub glyph_width_ratio: f32,
    pub container_label_font_size: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            words_per_line: 2,
            glyph_width_ratio: 0.6,
            container_label_font_size: 14.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerLayoutConfig {
    pub margin_x: f32,
    pub margin_top: f32,
    pub container_gap: f32,
    pub single_row_threshold: usize,
    pub max_grid_columns: usize,
    pub cell_width: f32,
    pub cell_height: f32,
    pub row_pitch: f32,
    pub wrapped_label_extra: f32,
    pub min_width: f32,
    pub min_height: f32,
    pub width_padding: f32,
    pub height_padding: f32,
    pub label_padding: f32,
    pub child_inset_x: f32,
    pub child_top_gap: f32,
    pub child_bottom_pad: f32,
    pub header_base: f32,
    pub label_line_height: f32,
    pub subtitle_line_height: f32,
    pub orphan_columns: usize,
    pub orphan_spacing_x: f32,
    pub orphan_spacing_y: f32,
}

impl Default for ContainerLayoutConfig {
    fn default() -> Self {
        Self {
            margin_x: 50.0,
            margin_top: 50.0,
            container_gap: 50.0,
            single_row_threshold: 5,
            max_grid_columns: 4,
            cell_width: 150.0,
            cell_height: 140.0,
            row_pitch: 130.0,
            wrapped_label_extra: 20.0,
            min_width: 300.0,
            min_height: 180.0,
            width_padding: 100.0,
            height_padding: 80.0,
            label_padding: 100.0,
            child_inset_x: 50.0,
            child_top_gap: 20.0,
            child_bottom_pad: 30.0,
            header_base: 28.0,
            label_line_height: 16.0,
            subtitle_line_height: 14.0,
            orphan_columns: 5,
            orphan_spacing_x: 280.0,
            orphan_spacing_y: 160.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchicalLayoutConfig {
    pub base_x: f32,
    pub base_y: f32,
    pub layer_spacing: f32,
    pub node_spacing: f32,
    pub fallback_root_count: usize,
    pub group_by_subtitle: bool,
}

impl Default for HierarchicalLayoutConfig {
    fn default() -> Self {
        Self {
            base_x: 100.0,
            base_y: 100.0,
            layer_spacing: 280.0,
            node_spacing: 320.0,
            fallback_root_count: 3,
            group_by_subtitle: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionConfig {
    pub min_distance: f32,
    pub max_iterations: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            min_distance: 180.0,
            max_iterations: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub text: TextConfig,
    pub container: ContainerLayoutConfig,
    pub hierarchical: HierarchicalLayoutConfig,
    pub collision: CollisionConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 70.0,
            node_height: 70.0,
            text: TextConfig::default(),
            container: ContainerLayoutConfig::default(),
            hierarchical: HierarchicalLayoutConfig::default(),
            collision: CollisionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    node_width: Option<f32>,
    node_height: Option<f32>,
    text: Option<TextConfigFile>,
    container: Option<ContainerConfigFile>,
    hierarchical: Option<HierarchicalConfigFile>,
    collision: Option<CollisionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TextConfigFile {
    words_per_line: Option<usize>,
    glyph_width_ratio: Option<f32>,
    container_label_font_size: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ContainerConfigFile {
    margin_x: Option<f32>,
    margin_top: Option<f32>,
    container_gap: Option<f32>,
    single_row_threshold: Option<usize>,
    max_grid_columns: Option<usize>,
    cell_width: Option<f32>,
    cell_height: Option<f32>,
    row_pitch: Option<f32>,
    min_width: Option<f32>,
    min_height: Option<f32>,
    orphan_columns: Option<usize>,
    orphan_spacing_x: Option<f32>,
    orphan_spacing_y: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct HierarchicalConfigFile {
    base_x: Option<f32>,
    base_y: Option<f32>,
    layer_spacing: Option<f32>,
    node_spacing: Option<f32>,
    fallback_root_count: Option<usize>,
    group_by_subtitle: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CollisionConfigFile {
    min_distance: Option<f32>,
    max_iterations: Option<usize>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(_) => json5::from_str(contents)?,
    };
    let mut config = Config::default();
    apply_config_file(&mut config.layout, parsed);
    Ok(config)
}

fn apply_config_file(layout: &mut LayoutConfig, parsed: ConfigFile) {
    if let Some(v) = parsed.node_width {
        layout.node_width = v.max(1.0);
    }
    if let Some(v) = parsed.node_height {
        layout.node_height = v.max(1.0);
    }

    if let Some(text) = parsed.text {
        if let Some(v) = text.words_per_line {
            layout.text.words_per_line = v.max(1);
        }
        if let Some(v) = text.glyph_width_ratio {
            layout.text.glyph_width_ratio = v;
        }
        if let Some(v) = text.container_label_font_size {
            layout.text.container_label_font_size = v;
        }
    }

    if let Some(c) = parsed.container {
        let target = &mut layout.container;
        if let Some(v) = c.margin_x {
            target.margin_x = v;
        }
        if let Some(v) = c.margin_top {
            target.margin_top = v;
        }
        if let Some(v) = c.container_gap {
            target.container_gap = v;
        }
        if let Some(v) = c.single_row_threshold {
            target.single_row_threshold = v;
        }
        if let Some(v) = c.max_grid_columns {
            target.max_grid_columns = v.max(1);
        }
        if let Some(v) = c.cell_width {
            target.cell_width = v;
        }
        if let Some(v) = c.cell_height {
            target.cell_height = v;
        }
        if let Some(v) = c.row_pitch {
            target.row_pitch = v;
        }
        if let Some(v) = c.min_width {
            target.min_width = v;
        }
        if let Some(v) = c.min_height {
            target.min_height = v;
        }
        if let Some(v) = c.orphan_columns {
            target.orphan_columns = v.max(1);
        }
        if let Some(v) = c.orphan_spacing_x {
            target.orphan_spacing_x = v;
        }
        if let Some(v) = c.orphan_spacing_y {
            target.orphan_spacing_y = v;
        }
    }

    if let Some(h) = parsed.hierarchical {
        let target = &mut layout.hierarchical;
        if let Some(v) = h.base_x {
            target.base_x = v;
        }
        if let Some(v) = h.base_y {
            target.base_y = v;
        }
        if let Some(v) = h.layer_spacing {
            target.layer_spacing = v;
        }
        if let Some(v) = h.node_spacing {
            target.node_spacing = v;
        }
        if let Some(v) = h.fallback_root_count {
            target.fallback_root_count = v;
        }
        if let Some(v) = h.group_by_subtitle {
            target.group_by_subtitle = v;
        }
    }

    if let Some(c) = parsed.collision {
        if let Some(v) = c.min_distance {
            layout.collision.min_distance = v.max(0.0);
        }
        if let Some(v) = c.max_iterations {
            layout.collision.max_iterations = v;
        }
    }
}
