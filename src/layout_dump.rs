use crate::geometry::{bounding_box, nearest_edge_points};
use crate::graph::ArrowMode;
use crate::layout::{CostBreakdown, OptimizationInfo};
use crate::mind_map::MindMapData;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub report: Option<OptimizationInfo>,
    pub cost: Option<CostBreakdown>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub index: usize,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: usize,
    pub to: usize,
    pub arrow_mode: ArrowMode,
    pub dashed: bool,
    pub points: Vec<[f64; 2]>,
}

impl LayoutDump {
    pub fn from_mind_map(data: &MindMapData, report: Option<OptimizationInfo>) -> Self {
        let graph = data.graph();
        let nodes: Vec<NodeDump> = graph
            .nodes()
            .iter()
            .filter_map(|node| {
                Some(NodeDump {
                    index: node.index?,
                    text: node.text.clone(),
                    x: node.location.x,
                    y: node.location.y,
                    width: node.size.width,
                    height: node.size.height,
                })
            })
            .collect();

        let edges = graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let from = graph.node(edge.from)?;
                let to = graph.node(edge.to)?;
                let (start, end) = nearest_edge_points(from.location, from.size, to.location, to.size);
                Some(EdgeDump {
                    from: edge.from,
                    to: edge.to,
                    arrow_mode: edge.arrow_mode,
                    dashed: edge.dashed_line,
                    points: vec![[start.x, start.y], [end.x, end.y]],
                })
            })
            .collect();

        let bounds = bounding_box(graph.nodes().iter().map(|node| node.bounding_rect()));
        LayoutDump {
            name: data.name.clone(),
            width: bounds.map(|b| b.width).unwrap_or(0.0),
            height: bounds.map(|b| b.height).unwrap_or(0.0),
            nodes,
            edges,
            report,
            cost: None,
        }
    }

    pub fn with_cost(mut self, cost: CostBreakdown) -> Self {
        self.cost = Some(cost);
        self
    }
}

pub fn write_layout_dump(path: Option<&Path>, dump: &LayoutDump) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, dump)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
