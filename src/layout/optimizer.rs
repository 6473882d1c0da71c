use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

use crate::config::OptimizerConfig;
use crate::error::{LayoutError, Result};
use crate::geometry::Point;
use crate::grid::Grid;
use crate::mind_map::SharedMindMap;

use super::cost::{CostBreakdown, CostModel};
use super::types::{CancelHandle, LayoutSnapshot, OptimizationInfo, ProgressCallback};

const IMPROVEMENT_EPS: f64 = 1e-9;

const DIRECTIONS: [(f64, f64); 8] = [
    (-1.0, -1.0),
    (0.0, -1.0),
    (1.0, -1.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, 1.0),
    (0.0, 1.0),
    (1.0, 1.0),
];

#[derive(Debug, Clone, Copy)]
struct Constraints {
    aspect_ratio: f64,
    min_edge_length: f64,
}

/// Rearranges the nodes of a shared mind map to reduce overlap, short edges,
/// edge crossings and deviation from a target aspect ratio.
///
/// The optimizer works on a private snapshot taken by [`initialize`]; the
/// shared graph is only written by [`extract`], under a single write lock.
///
/// [`initialize`]: LayoutOptimizer::initialize
/// [`extract`]: LayoutOptimizer::extract
pub struct LayoutOptimizer {
    mind_map: SharedMindMap,
    grid: Grid,
    config: OptimizerConfig,
    constraints: Option<Constraints>,
    snapshot: LayoutSnapshot,
    best: Option<Vec<Point>>,
    progress: Option<ProgressCallback>,
    cancel: CancelHandle,
}

impl LayoutOptimizer {
    pub fn new(mind_map: SharedMindMap, grid: Grid) -> Self {
        Self::with_config(mind_map, grid, OptimizerConfig::default())
    }

    pub fn with_config(mind_map: SharedMindMap, grid: Grid, config: OptimizerConfig) -> Self {
        Self {
            mind_map,
            grid,
            config,
            constraints: None,
            snapshot: LayoutSnapshot::default(),
            best: None,
            progress: None,
            cancel: CancelHandle::new(),
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: FnMut(f64) + Send + 'static,
    {
        self.progress = Some(Box::new(callback));
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn initialize(&mut self, aspect_ratio: f64, min_edge_length: f64) -> Result<()> {
        self.config.validate()?;
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(LayoutError::InvalidArgument(format!(
                "aspect ratio must be positive, got {aspect_ratio}"
            )));
        }
        if !min_edge_length.is_finite() || min_edge_length <= 0.0 {
            return Err(LayoutError::InvalidArgument(format!(
                "minimum edge length must be positive, got {min_edge_length}"
            )));
        }
        self.snapshot = LayoutSnapshot::from_graph(self.mind_map.read().graph());
        self.constraints = Some(Constraints {
            aspect_ratio,
            min_edge_length,
        });
        self.best = None;
        self.cancel.reset();
        debug!(
            nodes = self.snapshot.len(),
            edges = self.snapshot.edges.len(),
            aspect_ratio,
            min_edge_length,
            "layout optimizer initialized"
        );
        Ok(())
    }

    /// Cost split of the snapshot the next [`optimize`](Self::optimize) call
    /// starts from.
    pub fn cost_breakdown(&self) -> Result<CostBreakdown> {
        let constraints = self.require_constraints()?;
        let model = self.cost_model(constraints);
        Ok(model.breakdown(&self.snapshot.positions))
    }

    pub fn optimize(&mut self) -> Result<OptimizationInfo> {
        let constraints = self.require_constraints()?;
        let model = CostModel::new(
            &self.snapshot.sizes,
            &self.snapshot.edges,
            constraints.aspect_ratio,
            constraints.min_edge_length,
            &self.config,
        );
        let start = &self.snapshot.positions;
        let initial_cost = model.total(start);
        info!(
            nodes = start.len(),
            edges = self.snapshot.edges.len(),
            initial_cost,
            "layout optimization started"
        );

        let mut reporter = ProgressReporter::new(self.progress.as_mut());
        if start.len() < 2 {
            reporter.report(1.0);
            self.best = Some(start.iter().map(|pos| self.grid.snap(*pos)).collect());
            return Ok(OptimizationInfo {
                initial_cost,
                final_cost: initial_cost,
                changes: 0,
            });
        }

        let outcome = anneal(
            &model,
            start,
            &self.grid,
            &self.config,
            &self.cancel,
            &mut reporter,
        );
        reporter.report(1.0);

        let final_cost = model.total(&outcome.best);
        if final_cost > initial_cost {
            warn!(
                initial_cost,
                final_cost, "no grid-aligned layout matched the off-grid starting cost"
            );
        }
        info!(
            initial_cost,
            final_cost,
            changes = outcome.changes,
            sweeps = outcome.sweeps,
            cancelled = outcome.cancelled,
            "layout optimization finished"
        );
        self.best = Some(outcome.best);
        Ok(OptimizationInfo {
            initial_cost,
            final_cost,
            changes: outcome.changes,
        })
    }

    /// Writes the best positions found, snapped to the grid, back into the
    /// shared graph. Nodes deleted since [`initialize`](Self::initialize) are
    /// skipped.
    pub fn extract(&mut self) -> Result<()> {
        let Some(best) = self.best.as_ref() else {
            return Err(LayoutError::InvalidState(
                "extract() called before optimize()".to_string(),
            ));
        };
        let snapped: Vec<Point> = best.iter().map(|pos| self.grid.snap(*pos)).collect();
        {
            let mut data = self.mind_map.write();
            let graph = data.graph_mut();
            for (&index, &location) in self.snapshot.indices.iter().zip(&snapped) {
                match graph.node_mut(index) {
                    Some(node) => node.location = location,
                    None => warn!(index, "node removed since initialize(), not moved"),
                }
            }
        }
        debug!(nodes = snapped.len(), "layout extracted");
        self.snapshot.positions = snapped;
        Ok(())
    }

    fn require_constraints(&self) -> Result<Constraints> {
        self.constraints.ok_or_else(|| {
            LayoutError::InvalidState("optimize() called before initialize()".to_string())
        })
    }

    fn cost_model(&self, constraints: Constraints) -> CostModel<'_> {
        CostModel::new(
            &self.snapshot.sizes,
            &self.snapshot.edges,
            constraints.aspect_ratio,
            constraints.min_edge_length,
            &self.config,
        )
    }
}

/// Forwards strictly increasing progress values to the registered callback.
struct ProgressReporter<'a> {
    callback: Option<&'a mut ProgressCallback>,
    last: f64,
}

impl<'a> ProgressReporter<'a> {
    fn new(callback: Option<&'a mut ProgressCallback>) -> Self {
        Self {
            callback,
            last: 0.0,
        }
    }

    fn report(&mut self, value: f64) {
        let value = value.clamp(0.0, 1.0);
        if value <= self.last {
            return;
        }
        self.last = value;
        if let Some(callback) = self.callback.as_mut() {
            callback(value);
        }
    }
}

struct SearchOutcome {
    best: Vec<Point>,
    changes: usize,
    sweeps: usize,
    cancelled: bool,
}

/// Simulated annealing over grid-aligned positions. Each node in turn tries
/// the eight neighbouring moves at the current step; the best one is taken
/// when it lowers the cost, otherwise a random one may be taken while the
/// temperature allows it. Only grid-aligned states are ever kept as best, so
/// the returned positions are exactly what [`LayoutOptimizer::extract`]
/// writes.
fn anneal(
    model: &CostModel<'_>,
    start: &[Point],
    grid: &Grid,
    config: &OptimizerConfig,
    cancel: &CancelHandle,
    reporter: &mut ProgressReporter<'_>,
) -> SearchOutcome {
    let node_count = start.len();
    let max_sweeps = config.max_sweeps.max(1);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let mut current: Vec<Point> = start.iter().map(|pos| grid.snap(*pos)).collect();
    let mut best = current.clone();
    let mut best_cost = model.total(&current);

    let start_step = model.min_edge_length().max(model.max_node_extent());
    let mut step_scale = 1.0;
    let mut temperature = config.initial_temperature * (best_cost / node_count as f64);
    let mut changes = 0usize;
    let mut sweeps = 0usize;
    let mut cancelled = false;
    let mut candidates = [(Point::default(), 0.0f64); DIRECTIONS.len()];

    for sweep in 0..max_sweeps {
        if cancel.is_cancelled() {
            debug!(sweep, "layout optimization cancelled");
            cancelled = true;
            break;
        }
        sweeps = sweep + 1;
        let step = grid.snap_step(start_step * step_scale);
        let hot = temperature > config.min_temperature;
        let mut improved = false;
        let mut accepted = 0usize;

        for node in 0..node_count {
            if let Some((target, _)) =
                evaluate_moves(model, &mut current, node, step, grid, &mut candidates)
            {
                current[node] = target;
                improved = true;
                accepted += 1;
                continue;
            }
            if hot {
                let (target, delta) = candidates[rng.gen_range(0..candidates.len())];
                if rng.r#gen::<f64>() < (-delta / temperature).exp() {
                    current[node] = target;
                    accepted += 1;
                }
            }
        }
        changes += accepted;

        let current_cost = model.total(&current);
        if current_cost < best_cost - IMPROVEMENT_EPS {
            best.clone_from(&current);
            best_cost = current_cost;
        }
        trace!(sweep, step, temperature, accepted, current_cost, best_cost, "sweep");

        let at_min_step = step <= grid.cell_size();
        temperature *= config.cooling;
        step_scale *= config.step_decay;
        reporter.report(sweeps as f64 / max_sweeps as f64);

        if !improved && at_min_step && temperature <= config.min_temperature {
            debug!(sweep, "layout optimization converged");
            break;
        }
    }

    if !cancelled && !cancel.is_cancelled() {
        let polished = polish(model, &mut best, grid, start_step, config.polish_sweeps, cancel);
        debug!(moves = polished, "greedy polish finished");
        changes += polished;
    }

    SearchOutcome {
        best,
        changes,
        sweeps,
        cancelled,
    }
}

/// Scores the eight moves of `node` at `step` into `candidates` and returns
/// the strictly improving one with the lowest delta, if any.
fn evaluate_moves(
    model: &CostModel<'_>,
    positions: &mut [Point],
    node: usize,
    step: f64,
    grid: &Grid,
    candidates: &mut [(Point, f64); DIRECTIONS.len()],
) -> Option<(Point, f64)> {
    let origin = positions[node];
    let mut best_move = None;
    let mut best_delta = -IMPROVEMENT_EPS;
    for (slot, (dx, dy)) in DIRECTIONS.iter().enumerate() {
        let target = grid.snap(origin.offset(dx * step, dy * step));
        let delta = model.move_delta(positions, node, target);
        candidates[slot] = (target, delta);
        if delta < best_delta {
            best_delta = delta;
            best_move = Some((target, delta));
        }
    }
    best_move
}

/// Greedy descent from the best annealed state, halving the step from
/// `start_step` down to one cell and repeating each level until no node can
/// improve. Returns the number of moves taken.
fn polish(
    model: &CostModel<'_>,
    positions: &mut [Point],
    grid: &Grid,
    start_step: f64,
    max_passes: usize,
    cancel: &CancelHandle,
) -> usize {
    let mut candidates = [(Point::default(), 0.0f64); DIRECTIONS.len()];
    let mut step = grid.snap_step(start_step);
    let mut passes = 0usize;
    let mut moves = 0usize;
    loop {
        let mut improved = true;
        while improved && passes < max_passes {
            if cancel.is_cancelled() {
                return moves;
            }
            passes += 1;
            improved = false;
            for node in 0..positions.len() {
                if let Some((target, _)) =
                    evaluate_moves(model, positions, node, step, grid, &mut candidates)
                {
                    positions[node] = target;
                    improved = true;
                    moves += 1;
                }
            }
        }
        if step <= grid.cell_size() || passes >= max_passes {
            return moves;
        }
        step = grid.snap_step(step * 0.5);
    }
}
