use crate::error::{LayoutError, Result};
use crate::geometry::Point;

/// Quantization lattice for node positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    cell_size: f64,
}

impl Grid {
    pub fn new(cell_size: f64) -> Result<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(LayoutError::InvalidArgument(format!(
                "grid cell size must be positive, got {cell_size}"
            )));
        }
        Ok(Self { cell_size })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn snap_value(&self, value: f64) -> f64 {
        (value / self.cell_size).round() * self.cell_size
    }

    pub fn snap(&self, point: Point) -> Point {
        Point::new(self.snap_value(point.x), self.snap_value(point.y))
    }

    /// Rounds a distance to a whole number of cells, never below one cell.
    pub fn snap_step(&self, step: f64) -> f64 {
        self.snap_value(step).max(self.cell_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_cell() {
        assert!(matches!(Grid::new(0.0), Err(LayoutError::InvalidArgument(_))));
        assert!(matches!(Grid::new(-5.0), Err(LayoutError::InvalidArgument(_))));
        assert!(matches!(Grid::new(f64::NAN), Err(LayoutError::InvalidArgument(_))));
    }

    #[test]
    fn snaps_to_nearest_cell() {
        let grid = Grid::new(20.0).unwrap();
        assert_eq!(grid.snap(Point::new(29.0, -31.0)), Point::new(20.0, -40.0));
        assert_eq!(grid.snap_value(9.0), 0.0);
        assert_eq!(grid.snap_step(3.0), 20.0);
        assert_eq!(grid.snap_step(55.0), 60.0);
    }
}
