use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::geometry::{Point, Size};
use crate::graph::Graph;

/// Before/after report of one optimizer run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct OptimizationInfo {
    pub initial_cost: f64,
    pub final_cost: f64,
    /// Accepted moves, including uphill moves taken while the search is hot.
    pub changes: usize,
}

impl OptimizationInfo {
    pub fn improvement(&self) -> f64 {
        self.initial_cost - self.final_cost
    }
}

pub type ProgressCallback = Box<dyn FnMut(f64) + Send>;

/// Cooperative stop flag, checked by the optimizer once per sweep.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Private copy of the graph the optimizer works on. Node `i` here maps to
/// graph index `indices[i]`; edges refer to the dense positions.
#[derive(Debug, Clone, Default)]
pub(crate) struct LayoutSnapshot {
    pub indices: Vec<usize>,
    pub positions: Vec<Point>,
    pub sizes: Vec<Size>,
    pub edges: Vec<(usize, usize)>,
}

impl LayoutSnapshot {
    pub fn from_graph(graph: &Graph) -> Self {
        let mut snapshot = Self::default();
        let mut dense = HashMap::new();
        for node in graph.nodes() {
            let Some(index) = node.index else {
                continue;
            };
            dense.insert(index, snapshot.indices.len());
            snapshot.indices.push(index);
            snapshot.positions.push(node.location);
            snapshot.sizes.push(node.size);
        }
        for edge in graph.edges() {
            if let (Some(&a), Some(&b)) = (dense.get(&edge.from), dense.get(&edge.to)) {
                snapshot.edges.push((a, b));
            }
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }
}
