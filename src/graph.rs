use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LayoutError, Result};
use crate::geometry::{Point, Rect, Size};

pub const NODE_MIN_WIDTH: f64 = 200.0;
pub const NODE_MIN_HEIGHT: f64 = 75.0;
pub const NODE_DEFAULT_CORNER_RADIUS: u32 = 5;
pub const NODE_DEFAULT_TEXT_SIZE: u32 = 11;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// `None` until the node is attached to a graph.
    pub index: Option<usize>,
    pub location: Point,
    pub size: Size,
    pub text: String,
    pub color: String,
    pub text_color: String,
    pub text_size: u32,
    pub corner_radius: u32,
    pub image_ref: Option<usize>,
}

impl Node {
    pub fn new() -> Self {
        Self {
            index: None,
            location: Point::default(),
            size: Size::new(NODE_MIN_WIDTH, NODE_MIN_HEIGHT),
            text: String::new(),
            color: "#ffffff".to_string(),
            text_color: "#000000".to_string(),
            text_size: NODE_DEFAULT_TEXT_SIZE,
            corner_radius: NODE_DEFAULT_CORNER_RADIUS,
            image_ref: None,
        }
    }

    pub fn at(location: Point, size: Size) -> Self {
        Self {
            location,
            size,
            ..Self::new()
        }
    }

    pub fn bounding_rect(&self) -> Rect {
        Rect::centered(self.location, self.size)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArrowMode {
    #[default]
    Single,
    Double,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub arrow_mode: ArrowMode,
    #[serde(default)]
    pub dashed_line: bool,
    #[serde(default)]
    pub reversed: bool,
}

impl Edge {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            text: String::new(),
            arrow_mode: ArrowMode::Single,
            dashed_line: false,
            reversed: false,
        }
    }

    pub fn touches(&self, index: usize) -> bool {
        self.from == index || self.to == index
    }

    /// Direction-agnostic match against an unordered node pair.
    pub fn connects(&self, index0: usize, index1: usize) -> bool {
        (self.from == index0 && self.to == index1) || (self.from == index1 && self.to == index0)
    }
}

/// Node and edge store of a single mind map.
///
/// Indices handed out by [`Graph::add_node`] are never reused for the lifetime
/// of the graph, so callers can hold on to them across deletions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    next_index: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.next_index = 0;
    }

    /// Inserts a node and returns its index. Unindexed nodes get the next free
    /// index; a pre-indexed node keeps its index unless it is already taken.
    pub fn add_node(&mut self, mut node: Node) -> Result<usize> {
        let index = match node.index {
            Some(index) => {
                if self.node(index).is_some() {
                    return Err(LayoutError::InvalidState(format!(
                        "node {index} is already in the graph"
                    )));
                }
                index
            }
            None => self.next_index,
        };
        let Some(after) = index.checked_add(1) else {
            return Err(LayoutError::InvalidArgument(format!(
                "node index {index} leaves no room for further nodes"
            )));
        };
        self.next_index = self.next_index.max(after);
        node.index = Some(index);
        debug!(index, "add node");
        self.nodes.push(node);
        Ok(index)
    }

    /// Inserts a default node under the next free index.
    pub fn create_node(&mut self) -> Result<usize> {
        self.add_node(Node::new())
    }

    /// Removes the node and every edge touching it in one step.
    pub fn delete_node(&mut self, index: usize) -> Result<()> {
        let Some(pos) = self.position_of(index) else {
            return Err(LayoutError::NotFound(format!("node {index}")));
        };
        let before = self.edges.len();
        self.edges.retain(|edge| !edge.touches(index));
        self.nodes.remove(pos);
        debug!(index, removed_edges = before - self.edges.len(), "delete node");
        Ok(())
    }

    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        if edge.from == edge.to {
            return Err(LayoutError::InvalidArgument(format!(
                "edge from node {} to itself",
                edge.from
            )));
        }
        for index in [edge.from, edge.to] {
            if self.node(index).is_none() {
                return Err(LayoutError::InvalidArgument(format!(
                    "edge endpoint {index} is not in the graph"
                )));
            }
        }
        if self.are_directly_connected(edge.from, edge.to) {
            return Err(LayoutError::InvalidArgument(format!(
                "nodes {} and {} are already connected",
                edge.from, edge.to
            )));
        }
        debug!(from = edge.from, to = edge.to, "add edge");
        self.edges.push(edge);
        Ok(())
    }

    pub fn connect(&mut self, index0: usize, index1: usize) -> Result<()> {
        self.add_edge(Edge::new(index0, index1))
    }

    pub fn delete_edge(&mut self, index0: usize, index1: usize) -> Result<()> {
        let Some(pos) = self.edges.iter().position(|e| e.connects(index0, index1)) else {
            return Err(LayoutError::NotFound(format!("edge {index0}-{index1}")));
        };
        self.edges.remove(pos);
        debug!(index0, index1, "delete edge");
        Ok(())
    }

    pub fn are_directly_connected(&self, index0: usize, index1: usize) -> bool {
        self.edges.iter().any(|edge| edge.connects(index0, index1))
    }

    pub fn edges_from_node(&self, index: usize) -> Vec<&Edge> {
        self.edges.iter().filter(|edge| edge.from == index).collect()
    }

    pub fn edges_to_node(&self, index: usize) -> Vec<&Edge> {
        self.edges.iter().filter(|edge| edge.to == index).collect()
    }

    pub fn nodes_connected_to_node(&self, index: usize) -> Vec<&Node> {
        let neighbors: BTreeSet<usize> = self
            .edges
            .iter()
            .filter_map(|edge| {
                if edge.from == index {
                    Some(edge.to)
                } else if edge.to == index {
                    Some(edge.from)
                } else {
                    None
                }
            })
            .collect();
        neighbors.into_iter().filter_map(|idx| self.node(idx)).collect()
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.iter().find(|node| node.index == Some(index))
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.index == Some(index))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    fn position_of(&self, index: usize) -> Option<usize> {
        self.nodes.iter().position(|node| node.index == Some(index))
    }
}
