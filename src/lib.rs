#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod grid;
pub mod layout;
pub mod layout_dump;
pub mod mind_map;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, OptimizerConfig, load_config};
pub use error::{LayoutError, Result};
pub use geometry::{Point, Rect, Size};
pub use graph::{ArrowMode, Edge, Graph, Node};
pub use grid::Grid;
pub use layout::{CancelHandle, CostBreakdown, LayoutOptimizer, OptimizationInfo};
pub use mind_map::{MindMapData, SharedMindMap};
