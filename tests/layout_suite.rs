use std::sync::Arc;

use approx::assert_relative_eq;
use mindmap_layout::{
    Grid, LayoutError, LayoutOptimizer, MindMapData, Node, OptimizationInfo, OptimizerConfig,
    Point, SharedMindMap, Size,
};
use parking_lot::Mutex;

fn mind_map(nodes: &[(f64, f64, f64, f64)], edges: &[(usize, usize)]) -> SharedMindMap {
    let mut data = MindMapData::new("suite");
    let graph = data.graph_mut();
    for &(x, y, w, h) in nodes {
        graph
            .add_node(Node::at(Point::new(x, y), Size::new(w, h)))
            .expect("node insert failed");
    }
    for &(a, b) in edges {
        graph.connect(a, b).expect("edge insert failed");
    }
    data.into_shared()
}

/// Six default-sized nodes piled on top of each other, wired as a small tree.
/// Positions sit on a 20-unit grid.
fn pile() -> SharedMindMap {
    let nodes: Vec<_> = (0..6)
        .map(|i| (i as f64 * 20.0, (i % 2) as f64 * 20.0, 120.0, 50.0))
        .collect();
    mind_map(&nodes, &[(0, 1), (0, 2), (0, 3), (1, 4), (2, 5)])
}

fn run(shared: &SharedMindMap, grid: Grid, config: OptimizerConfig) -> OptimizationInfo {
    let mut optimizer = LayoutOptimizer::with_config(shared.clone(), grid, config);
    optimizer.initialize(1.0, 100.0).expect("initialize failed");
    let info = optimizer.optimize().expect("optimize failed");
    optimizer.extract().expect("extract failed");
    info
}

fn positions(shared: &SharedMindMap) -> Vec<Point> {
    shared
        .read()
        .graph()
        .nodes()
        .iter()
        .map(|node| node.location)
        .collect()
}

#[test]
fn empty_and_single_node_graphs_are_free() {
    for nodes in [vec![], vec![(5.0, 5.0, 200.0, 75.0)]] {
        let shared = mind_map(&nodes, &[]);
        let mut optimizer = LayoutOptimizer::new(shared, Grid::new(10.0).unwrap());
        optimizer.initialize(1.0, 100.0).unwrap();
        let info = optimizer.optimize().unwrap();
        assert_eq!(info.initial_cost, 0.0);
        assert_eq!(info.final_cost, 0.0);
        assert_eq!(info.changes, 0);
    }
}

#[test]
fn overlapping_pair_is_pulled_apart() {
    let shared = mind_map(&[(0.0, 0.0, 40.0, 40.0), (10.0, 0.0, 40.0, 40.0)], &[(0, 1)]);
    let mut optimizer = LayoutOptimizer::new(shared.clone(), Grid::new(10.0).unwrap());
    optimizer.initialize(1.0, 100.0).unwrap();
    let info = optimizer.optimize().unwrap();
    assert!(info.initial_cost > 0.0);
    assert!(info.final_cost < info.initial_cost);
    assert!(info.changes > 0);
    optimizer.extract().unwrap();

    let data = shared.read();
    let a = data.graph().node(0).unwrap();
    let b = data.graph().node(1).unwrap();
    assert!(a.location.distance(b.location) >= 100.0 - 1e-6);
    assert!(!a.bounding_rect().intersects(&b.bounding_rect()));
}

#[test]
fn final_cost_never_exceeds_initial_cost() {
    let shared = pile();
    let info = run(&shared, Grid::new(20.0).unwrap(), OptimizerConfig::default());
    assert!(info.initial_cost > 0.0);
    assert!(info.final_cost <= info.initial_cost);
}

#[test]
fn committed_layout_costs_what_was_reported() {
    let shared = pile();
    let mut optimizer = LayoutOptimizer::new(shared, Grid::new(20.0).unwrap());
    optimizer.initialize(1.0, 100.0).unwrap();
    let info = optimizer.optimize().unwrap();
    optimizer.extract().unwrap();
    let committed = optimizer.cost_breakdown().unwrap();
    assert_relative_eq!(committed.total(), info.final_cost, epsilon = 1e-9);
}

#[test]
fn off_grid_input_is_not_snapped_into_overlap() {
    let shared = mind_map(&[(0.0, 0.0, 110.0, 110.0), (149.0, 149.0, 110.0, 110.0)], &[]);
    let mut optimizer = LayoutOptimizer::new(shared.clone(), Grid::new(100.0).unwrap());
    optimizer.initialize(1.0, 100.0).unwrap();
    let info = optimizer.optimize().unwrap();
    assert_eq!(info.initial_cost, 0.0);
    optimizer.extract().unwrap();

    let committed = optimizer.cost_breakdown().unwrap();
    assert_relative_eq!(committed.total(), info.final_cost, epsilon = 1e-9);
    assert_eq!(committed.overlap, 0.0);
    let data = shared.read();
    let a = data.graph().node(0).unwrap();
    let b = data.graph().node(1).unwrap();
    assert!(!a.bounding_rect().intersects(&b.bounding_rect()));
}

#[test]
fn reoptimizing_does_not_regress() {
    let shared = pile();
    let grid = Grid::new(20.0).unwrap();
    let first = run(&shared, grid, OptimizerConfig::default());
    let second = run(&shared, grid, OptimizerConfig::default());
    assert_relative_eq!(second.initial_cost, first.final_cost, epsilon = 1e-6);
    assert!(second.final_cost <= first.final_cost + 1e-6);
}

#[test]
fn extracted_positions_are_grid_aligned() {
    let shared = pile();
    let grid = Grid::new(25.0).unwrap();
    run(&shared, grid, OptimizerConfig::default());
    for point in positions(&shared) {
        for value in [point.x, point.y] {
            let cells = value / grid.cell_size();
            assert_relative_eq!(cells, cells.round(), epsilon = 1e-9);
        }
    }
}

#[test]
fn progress_increases_and_ends_at_one() {
    let shared = pile();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut optimizer = LayoutOptimizer::new(shared, Grid::new(20.0).unwrap());
    optimizer.set_progress_callback(move |value| sink.lock().push(value));
    optimizer.initialize(1.0, 100.0).unwrap();
    optimizer.optimize().unwrap();

    let values = seen.lock().clone();
    assert!(!values.is_empty());
    assert!(values.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(values.iter().all(|value| (0.0..=1.0).contains(value)));
    assert_eq!(values.last().copied(), Some(1.0));
}

#[test]
fn same_seed_gives_same_layout() {
    let a = pile();
    let b = pile();
    let grid = Grid::new(20.0).unwrap();
    let info_a = run(&a, grid, OptimizerConfig::default());
    let info_b = run(&b, grid, OptimizerConfig::default());
    assert_eq!(info_a, info_b);
    assert_eq!(positions(&a), positions(&b));
}

#[test]
fn cancelled_run_still_reports_valid_costs() {
    let shared = pile();
    let mut optimizer = LayoutOptimizer::new(shared.clone(), Grid::new(20.0).unwrap());
    optimizer.initialize(1.0, 100.0).unwrap();
    optimizer.cancel_handle().cancel();
    let info = optimizer.optimize().unwrap();
    assert_eq!(info.changes, 0);
    assert!(info.final_cost <= info.initial_cost);
    optimizer.extract().unwrap();
    assert_relative_eq!(
        optimizer.cost_breakdown().unwrap().total(),
        info.final_cost,
        epsilon = 1e-9
    );
}

#[test]
fn cancel_from_progress_callback_stops_early() {
    let shared = pile();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut optimizer = LayoutOptimizer::new(shared, Grid::new(20.0).unwrap());
    let cancel = optimizer.cancel_handle();
    optimizer.set_progress_callback(move |value| {
        sink.lock().push(value);
        cancel.cancel();
    });
    optimizer.initialize(1.0, 100.0).unwrap();
    let info = optimizer.optimize().unwrap();
    assert!(info.final_cost <= info.initial_cost);

    let values = seen.lock().clone();
    assert_eq!(values.len(), 2);
    assert_eq!(values.last().copied(), Some(1.0));
}

#[test]
fn initialize_resets_cancellation() {
    let shared = pile();
    let mut optimizer = LayoutOptimizer::new(shared, Grid::new(20.0).unwrap());
    optimizer.cancel_handle().cancel();
    optimizer.initialize(1.0, 100.0).unwrap();
    let info = optimizer.optimize().unwrap();
    assert!(info.changes > 0);
}

#[test]
fn misuse_is_reported_as_invalid_state() {
    let mut optimizer = LayoutOptimizer::new(pile(), Grid::new(20.0).unwrap());
    assert!(matches!(optimizer.optimize(), Err(LayoutError::InvalidState(_))));
    optimizer.initialize(1.0, 100.0).unwrap();
    assert!(matches!(optimizer.extract(), Err(LayoutError::InvalidState(_))));
    assert!(matches!(
        optimizer.initialize(-1.0, 100.0),
        Err(LayoutError::InvalidArgument(_))
    ));
}

#[test]
fn invalid_optimizer_config_is_rejected_on_initialize() {
    let config = OptimizerConfig {
        cooling: 1.5,
        ..OptimizerConfig::default()
    };
    let mut optimizer = LayoutOptimizer::with_config(pile(), Grid::new(20.0).unwrap(), config);
    assert!(matches!(
        optimizer.initialize(1.0, 100.0),
        Err(LayoutError::InvalidArgument(_))
    ));
}
