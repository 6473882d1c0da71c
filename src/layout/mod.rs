mod cost;
mod optimizer;
pub(crate) mod types;

pub use cost::CostBreakdown;
pub use optimizer::LayoutOptimizer;
pub use types::{CancelHandle, OptimizationInfo, ProgressCallback};
