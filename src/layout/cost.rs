use serde::Serialize;

use crate::config::OptimizerConfig;
use crate::geometry::{Point, Rect, Size, bounding_box, overlap_area, segments_intersect};

const MIN_EXTENT: f64 = 1e-9;

/// Per-term split of a layout cost. Every term is non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CostBreakdown {
    pub overlap: f64,
    pub edge_length: f64,
    pub stretch: f64,
    pub aspect: f64,
    pub crossings: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.overlap + self.edge_length + self.stretch + self.aspect + self.crossings
    }
}

/// Scores node placements for a fixed topology and fixed node sizes.
pub(crate) struct CostModel<'a> {
    sizes: &'a [Size],
    edges: &'a [(usize, usize)],
    incident: Vec<Vec<usize>>,
    aspect_ratio: f64,
    min_edge_length: f64,
    weights: &'a OptimizerConfig,
}

impl<'a> CostModel<'a> {
    pub fn new(
        sizes: &'a [Size],
        edges: &'a [(usize, usize)],
        aspect_ratio: f64,
        min_edge_length: f64,
        weights: &'a OptimizerConfig,
    ) -> Self {
        let mut incident = vec![Vec::new(); sizes.len()];
        for (edge_idx, &(a, b)) in edges.iter().enumerate() {
            incident[a].push(edge_idx);
            incident[b].push(edge_idx);
        }
        Self {
            sizes,
            edges,
            incident,
            aspect_ratio,
            min_edge_length,
            weights,
        }
    }

    pub fn min_edge_length(&self) -> f64 {
        self.min_edge_length
    }

    pub fn max_node_extent(&self) -> f64 {
        self.sizes
            .iter()
            .map(|size| size.width.max(size.height))
            .fold(0.0, f64::max)
    }

    pub fn total(&self, positions: &[Point]) -> f64 {
        self.breakdown(positions).total()
    }

    pub fn breakdown(&self, positions: &[Point]) -> CostBreakdown {
        let mut cost = CostBreakdown::default();
        if positions.len() < 2 {
            return cost;
        }
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                cost.overlap += self.overlap_cost(positions, i, positions[i], j);
            }
        }
        for &(a, b) in self.edges {
            let (short, long) = self.edge_length_cost(positions[a], positions[b]);
            cost.edge_length += short;
            cost.stretch += long;
        }
        for (e, &edge) in self.edges.iter().enumerate() {
            for &other in &self.edges[(e + 1)..] {
                if self.edges_cross(positions, edge, other) {
                    cost.crossings += self.weights.crossing_weight;
                }
            }
        }
        cost.aspect = self.aspect_cost(positions);
        cost
    }

    /// Change in total cost if `node` moved to `target`; `positions` is
    /// restored before returning.
    pub fn move_delta(&self, positions: &mut [Point], node: usize, target: Point) -> f64 {
        let origin = positions[node];
        let before = self.local_cost(positions, node) + self.aspect_cost(positions);
        positions[node] = target;
        let after = self.local_cost(positions, node) + self.aspect_cost(positions);
        positions[node] = origin;
        after - before
    }

    /// Every term that depends on the position of `node`, except the global
    /// aspect term.
    fn local_cost(&self, positions: &[Point], node: usize) -> f64 {
        let at = positions[node];
        let mut cost = 0.0;
        for other in 0..positions.len() {
            if other != node {
                cost += self.overlap_cost(positions, node, at, other);
            }
        }
        for &edge_idx in &self.incident[node] {
            let (a, b) = self.edges[edge_idx];
            let (short, long) = self.edge_length_cost(positions[a], positions[b]);
            cost += short + long;
            // Edge pairs sharing `node` never count as crossings, so each
            // crossing involving this edge is seen exactly once here.
            for &other in self.edges {
                if self.edges_cross(positions, (a, b), other) {
                    cost += self.weights.crossing_weight;
                }
            }
        }
        cost
    }

    fn overlap_cost(&self, positions: &[Point], node: usize, at: Point, other: usize) -> f64 {
        let a = Rect::centered(at, self.sizes[node]);
        let b = Rect::centered(positions[other], self.sizes[other]);
        overlap_area(&a, &b) * self.weights.overlap_weight
    }

    fn edge_length_cost(&self, a: Point, b: Point) -> (f64, f64) {
        let distance = a.distance(b);
        if distance < self.min_edge_length {
            (
                (self.min_edge_length - distance) * self.weights.edge_length_weight,
                0.0,
            )
        } else {
            (
                0.0,
                (distance - self.min_edge_length) * self.weights.stretch_weight,
            )
        }
    }

    fn edges_cross(&self, positions: &[Point], e: (usize, usize), f: (usize, usize)) -> bool {
        if e.0 == f.0 || e.0 == f.1 || e.1 == f.0 || e.1 == f.1 {
            return false;
        }
        segments_intersect(positions[e.0], positions[e.1], positions[f.0], positions[f.1])
    }

    fn aspect_cost(&self, positions: &[Point]) -> f64 {
        if positions.len() < 2 {
            return 0.0;
        }
        let rects = positions
            .iter()
            .zip(self.sizes)
            .map(|(pos, size)| Rect::centered(*pos, *size));
        let Some(bounds) = bounding_box(rects) else {
            return 0.0;
        };
        if bounds.width <= MIN_EXTENT || bounds.height <= MIN_EXTENT {
            return 0.0;
        }
        let ratio = bounds.width / bounds.height;
        let scale = (bounds.width + bounds.height) * 0.5;
        (ratio - self.aspect_ratio).abs() * scale * self.weights.aspect_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_sizes(count: usize) -> Vec<Size> {
        vec![Size::new(40.0, 40.0); count]
    }

    #[test]
    fn single_node_costs_nothing() {
        let sizes = square_sizes(1);
        let weights = OptimizerConfig::default();
        let model = CostModel::new(&sizes, &[], 3.0, 100.0, &weights);
        assert_eq!(model.total(&[Point::new(0.0, 0.0)]), 0.0);
        assert_eq!(model.total(&[]), 0.0);
    }

    #[test]
    fn overlapping_short_edge_is_penalized() {
        let sizes = square_sizes(2);
        let edges = [(0, 1)];
        let weights = OptimizerConfig::default();
        let model = CostModel::new(&sizes, &edges, 1.0, 100.0, &weights);
        let cost = model.breakdown(&[Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert_eq!(cost.overlap, 30.0 * 40.0 * weights.overlap_weight);
        assert_eq!(cost.edge_length, 90.0 * weights.edge_length_weight);
        assert_eq!(cost.stretch, 0.0);
        assert!(cost.aspect > 0.0);
        assert_eq!(cost.crossings, 0.0);
    }

    #[test]
    fn more_overlap_never_costs_less() {
        let sizes = square_sizes(2);
        let weights = OptimizerConfig::default();
        let model = CostModel::new(&sizes, &[], 1.0, 100.0, &weights);
        let near = model.breakdown(&[Point::new(0.0, 0.0), Point::new(0.0, 10.0)]);
        let far = model.breakdown(&[Point::new(0.0, 0.0), Point::new(0.0, 30.0)]);
        assert!(near.overlap > far.overlap);
    }

    #[test]
    fn crossing_edges_add_flat_penalty() {
        let sizes = vec![Size::new(1.0, 1.0); 4];
        let edges = [(0, 1), (2, 3)];
        let weights = OptimizerConfig::default();
        let model = CostModel::new(&sizes, &edges, 1.0, 1.0, &weights);
        let crossed = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 0.0),
        ];
        assert_eq!(model.breakdown(&crossed).crossings, weights.crossing_weight);
        let parallel = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
        ];
        assert_eq!(model.breakdown(&parallel).crossings, 0.0);
    }

    #[test]
    fn aspect_term_vanishes_on_target_ratio() {
        let sizes = square_sizes(2);
        let weights = OptimizerConfig::default();
        let model = CostModel::new(&sizes, &[], 1.0, 10.0, &weights);
        let diagonal = [Point::new(0.0, 0.0), Point::new(100.0, 100.0)];
        assert!(model.breakdown(&diagonal).aspect.abs() < 1e-9);
        let flat = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        assert!(model.breakdown(&flat).aspect > 0.0);
    }

    #[test]
    fn move_delta_matches_total_difference() {
        let sizes = square_sizes(4);
        let edges = [(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)];
        let weights = OptimizerConfig::default();
        let model = CostModel::new(&sizes, &edges, 1.5, 80.0, &weights);
        let mut positions = vec![
            Point::new(0.0, 0.0),
            Point::new(30.0, 10.0),
            Point::new(-20.0, 60.0),
            Point::new(90.0, 90.0),
        ];
        let before = model.total(&positions);
        let target = Point::new(120.0, -40.0);
        let delta = model.move_delta(&mut positions, 1, target);
        assert_eq!(positions[1], Point::new(30.0, 10.0));
        positions[1] = target;
        let after = model.total(&positions);
        assert!((after - before - delta).abs() < 1e-6);
    }

    fn without_aspect() -> OptimizerConfig {
        OptimizerConfig {
            aspect_weight: 0.0,
            ..OptimizerConfig::default()
        }
    }

    #[test]
    fn larger_length_deficit_never_costs_less() {
        let sizes = vec![Size::new(10.0, 10.0); 2];
        let edges = [(0, 1)];
        let weights = without_aspect();
        let model = CostModel::new(&sizes, &edges, 1.0, 100.0, &weights);
        let costs: Vec<CostBreakdown> = [80.0, 60.0, 40.0]
            .iter()
            .map(|&gap| model.breakdown(&[Point::new(0.0, 0.0), Point::new(gap, 0.0)]))
            .collect();
        for pair in costs.windows(2) {
            assert!(pair[1].edge_length > pair[0].edge_length);
            assert_eq!(pair[1].overlap, pair[0].overlap);
            assert_eq!(pair[1].crossings, pair[0].crossings);
            assert!(pair[1].total() >= pair[0].total());
        }
    }

    #[test]
    fn larger_aspect_deviation_never_costs_less() {
        let sizes = square_sizes(2);
        let weights = OptimizerConfig::default();
        let model = CostModel::new(&sizes, &[], 1.0, 100.0, &weights);
        let costs: Vec<CostBreakdown> = [100.0, 200.0, 300.0]
            .iter()
            .map(|&x| model.breakdown(&[Point::new(0.0, 0.0), Point::new(x, 100.0)]))
            .collect();
        assert!(costs[0].aspect.abs() < 1e-9);
        for pair in costs.windows(2) {
            assert!(pair[1].aspect > pair[0].aspect);
            assert_eq!(pair[1].overlap, 0.0);
            assert!(pair[1].total() >= pair[0].total());
        }
    }

    #[test]
    fn more_crossings_never_cost_less() {
        let sizes = vec![Size::new(1.0, 1.0); 6];
        let edges = [(0, 1), (2, 3), (4, 5)];
        let weights = without_aspect();
        let model = CostModel::new(&sizes, &edges, 1.0, 100.0, &weights);
        let layout = |first: f64, second: f64| {
            [
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(first, -50.0),
                Point::new(first, 50.0),
                Point::new(second, -50.0),
                Point::new(second, 50.0),
            ]
        };
        let costs: Vec<CostBreakdown> = [(150.0, 250.0), (50.0, 250.0), (30.0, 70.0)]
            .iter()
            .map(|&(first, second)| model.breakdown(&layout(first, second)))
            .collect();
        let crossings: Vec<f64> = costs.iter().map(|cost| cost.crossings).collect();
        assert_eq!(
            crossings,
            vec![0.0, weights.crossing_weight, 2.0 * weights.crossing_weight]
        );
        for pair in costs.windows(2) {
            assert_eq!(pair[1].overlap, pair[0].overlap);
            assert_eq!(pair[1].edge_length, pair[0].edge_length);
            assert_eq!(pair[1].stretch, pair[0].stretch);
            assert!(pair[1].total() > pair[0].total());
        }
    }
}
