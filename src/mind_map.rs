use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::graph::{Graph, NODE_DEFAULT_CORNER_RADIUS, NODE_DEFAULT_TEXT_SIZE};

/// Handle shared between the editor, renderers and the layout optimizer.
pub type SharedMindMap = Arc<RwLock<MindMapData>>;

/// Document-level data of one mind map: the graph plus display attributes
/// the core carries but never interprets.
#[derive(Debug, Clone, Serialize)]
pub struct MindMapData {
    pub name: String,
    pub file_name: Option<String>,
    pub version: String,
    pub background_color: String,
    pub edge_color: String,
    pub grid_color: String,
    pub edge_width: f64,
    pub text_size: u32,
    pub corner_radius: u32,
    graph: Graph,
}

impl MindMapData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            background_color: "#ffffff".to_string(),
            edge_color: "#000000".to_string(),
            grid_color: "#a0a0a0".to_string(),
            edge_width: 2.0,
            text_size: NODE_DEFAULT_TEXT_SIZE,
            corner_radius: NODE_DEFAULT_CORNER_RADIUS,
            graph: Graph::new(),
        }
    }

    pub fn with_graph(name: impl Into<String>, graph: Graph) -> Self {
        Self {
            graph,
            ..Self::new(name)
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn into_shared(self) -> SharedMindMap {
        Arc::new(RwLock::new(self))
    }
}

impl Default for MindMapData {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_handle_sees_graph_edits() {
        let shared = MindMapData::new("notes").into_shared();
        let index = shared.write().graph_mut().create_node().unwrap();
        let data = shared.read();
        assert_eq!(data.name, "notes");
        assert!(data.graph().node(index).is_some());
    }

    #[test]
    fn defaults_follow_node_defaults() {
        let data = MindMapData::default();
        assert_eq!(data.text_size, NODE_DEFAULT_TEXT_SIZE);
        assert_eq!(data.corner_radius, NODE_DEFAULT_CORNER_RADIUS);
        assert_eq!(data.graph().num_nodes(), 0);
    }
}
