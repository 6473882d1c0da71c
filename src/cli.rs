use crate::config::{Config, load_config};
use crate::geometry::{Point, Size};
use crate::graph::{Edge, NODE_MIN_HEIGHT, NODE_MIN_WIDTH, Node};
use crate::grid::Grid;
use crate::layout::LayoutOptimizer;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::mind_map::MindMapData;
use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const PROGRESS_TICKS: u64 = 1000;

#[derive(Parser, Debug)]
#[command(name = "mmlayout", version, about = "Automatic layout for mind-map graphs")]
pub struct Args {
    /// Input graph (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Optimizer config (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Target width/height ratio of the diagram
    #[arg(short = 'a', long = "aspectRatio")]
    pub aspect_ratio: Option<f64>,

    /// Minimum center-to-center edge length
    #[arg(short = 'm', long = "minEdgeLength")]
    pub min_edge_length: Option<f64>,

    /// Grid cell size used to align the result
    #[arg(short = 'g', long = "gridSize")]
    pub grid_size: Option<f64>,

    /// Random seed for the search
    #[arg(short = 's', long = "seed")]
    pub seed: Option<u64>,

    /// Do not draw a progress bar
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

#[derive(Debug, Deserialize)]
struct InputDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    nodes: Vec<InputNode>,
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct InputNode {
    index: Option<usize>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default = "default_width")]
    width: f64,
    #[serde(default = "default_height")]
    height: f64,
    #[serde(default)]
    text: String,
}

fn default_width() -> f64 {
    NODE_MIN_WIDTH
}

fn default_height() -> f64 {
    NODE_MIN_HEIGHT
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let input = read_input(args.input.as_deref())?;
    let data = build_mind_map(&input)?;
    let shared = data.into_shared();

    let grid = Grid::new(config.grid_size)?;
    let mut optimizer = LayoutOptimizer::with_config(shared.clone(), grid, config.optimizer);
    optimizer.initialize(config.aspect_ratio, config.min_edge_length)?;

    let bar = progress_bar(args.quiet);
    if let Some(bar) = bar.clone() {
        optimizer.set_progress_callback(move |progress| {
            bar.set_position((progress * PROGRESS_TICKS as f64).round() as u64);
        });
    }
    let info = optimizer.optimize()?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    optimizer.extract()?;
    let cost = optimizer.cost_breakdown()?;

    let dump = LayoutDump::from_mind_map(&shared.read(), Some(info)).with_cost(cost);
    write_layout_dump(args.output.as_deref(), &dump)?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(v) = args.aspect_ratio {
        config.aspect_ratio = v;
    }
    if let Some(v) = args.min_edge_length {
        config.min_edge_length = v;
    }
    if let Some(v) = args.grid_size {
        config.grid_size = v;
    }
    if let Some(v) = args.seed {
        config.optimizer.seed = v;
    }
}

fn progress_bar(quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }
    let bar = ProgressBar::new(PROGRESS_TICKS);
    let style = ProgressStyle::with_template(
        "{prefix:.bold.dim} {spinner:.green} [{elapsed_precise}] {wide_bar:.cyan/blue} {percent}%",
    )
    .ok()?
    .progress_chars("█▓░");
    bar.set_style(style);
    bar.set_prefix("layout");
    Some(bar)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn build_mind_map(input: &str) -> Result<MindMapData> {
    let document: InputDocument = match serde_json::from_str(input) {
        Ok(document) => document,
        Err(_) => json5::from_str(input)?,
    };
    let mut data = MindMapData::new(document.name);
    let graph = data.graph_mut();
    for input_node in document.nodes {
        let mut node = Node::at(
            Point::new(input_node.x, input_node.y),
            Size::new(input_node.width, input_node.height),
        );
        node.index = input_node.index;
        node.text = input_node.text;
        graph.add_node(node)?;
    }
    for edge in document.edges {
        graph.add_edge(edge)?;
    }
    Ok(data)
}
