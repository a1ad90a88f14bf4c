use arch_layout::{Config, LayoutDump, compute_layout, parse_config, parse_diagram};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOptions {
    /// Same shape as the CLI config file.
    config: Option<serde_json::Value>,
    /// Return the full dump (labels, edges, bounds) instead of bare positions.
    dump: Option<bool>,
}

fn build_config(options: &LayoutOptions) -> Result<Config, String> {
    match &options.config {
        Some(value) => parse_config(&value.to_string()).map_err(|error| error.to_string()),
        None => Ok(Config::default()),
    }
}

fn layout_json(input: &str, options: LayoutOptions) -> Result<String, String> {
    let config = build_config(&options)?;
    let graph = parse_diagram(input).map_err(|error| error.to_string())?;
    let positions = compute_layout(&graph, &config.layout);
    let json = if options.dump.unwrap_or(false) {
        serde_json::to_string(&LayoutDump::from_layout(&graph, &positions))
    } else {
        serde_json::to_string(&positions)
    };
    json.map_err(|error| error.to_string())
}

#[wasm_bindgen]
pub fn calculate_layout_json(input: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<LayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        LayoutOptions::default()
    };

    layout_json(input, options).map_err(|error| JsValue::from_str(&error))
}
