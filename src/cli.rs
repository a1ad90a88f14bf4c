use crate::config::load_config;
use crate::diagnostics::check_graph;
use crate::layout::compute_layout;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::parser::parse_diagram;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "arch-layout",
    version,
    about = "Compute positions for architecture diagrams (containers, layered graphs)"
)]
pub struct Args {
    /// Input diagram JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "dump")]
    pub output_format: OutputFormat,

    /// Layout config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Report repaired input problems (dangling references, cycles) as warnings
    #[arg(long = "check")]
    pub check: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Bare node id -> position map
    Positions,
    /// Positions plus labels, edges, stats and bounds
    Dump,
}

pub fn run(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_deref())
        .with_context(|| format!("failed to load config {:?}", args.config))?;
    let input = read_input(args.input.as_deref())?;
    let graph = parse_diagram(&input)?;
    debug!(
        "Parsed {} nodes and {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );

    if args.check {
        let issues = check_graph(&graph);
        for issue in &issues {
            warn!("{issue}");
        }
        info!("Input check found {} issue(s)", issues.len());
    }

    let positions = compute_layout(&graph, &config.layout);

    match (args.output_format, args.output.as_deref()) {
        (OutputFormat::Dump, Some(path)) => write_layout_dump(path, &graph, &positions)?,
        (OutputFormat::Dump, None) => {
            let dump = LayoutDump::from_layout(&graph, &positions);
            write_stdout(&serde_json::to_string_pretty(&dump)?)?;
        }
        (OutputFormat::Positions, output) => {
            let json = serde_json::to_string_pretty(&positions)?;
            match output {
                Some(path) => std::fs::write(path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => write_stdout(&json)?,
            }
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
        _ => {}
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}
