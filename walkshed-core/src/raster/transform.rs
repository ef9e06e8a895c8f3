//! North-up affine georeferencing for the coverage grid.

/// Maps between grid indices (col, row) and map coordinates for a
/// north-up grid with square cells:
///
/// ```text
/// x = origin_x + col * cell
/// y = origin_y - row * cell
/// ```
///
/// The origin is the upper-left corner of the upper-left cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    /// Cell size in map units
    pub cell: f64,
}

impl GridTransform {
    pub fn new(origin_x: f64, origin_y: f64, cell: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            cell,
        }
    }

    /// Map coordinates of a cell center.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.cell,
            self.origin_y - (row as f64 + 0.5) * self.cell,
        )
    }

    /// Fractional column of an x coordinate; `.floor()` gives the index.
    pub fn col_of(&self, x: f64) -> f64 {
        (x - self.origin_x) / self.cell
    }

    /// Fractional row of a y coordinate; `.floor()` gives the index.
    pub fn row_of(&self, y: f64) -> f64 {
        (self.origin_y - y) / self.cell
    }

    /// (min_x, min_y, max_x, max_y) covered by a grid of this shape.
    pub fn bounds(&self, cols: usize, rows: usize) -> (f64, f64, f64, f64) {
        (
            self.origin_x,
            self.origin_y - rows as f64 * self.cell,
            self.origin_x + cols as f64 * self.cell,
            self.origin_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn cell_center_round_trip() {
        let gt = GridTransform::new(100.0, 200.0, 10.0);
        let (x, y) = gt.cell_center(5, 10);
        assert_relative_eq!(gt.col_of(x), 5.5, epsilon = 1e-12);
        assert_relative_eq!(gt.row_of(y), 10.5, epsilon = 1e-12);
    }

    #[test]
    fn bounds_cover_the_grid() {
        let gt = GridTransform::new(0.0, 100.0, 1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 100);
        assert_relative_eq!(min_x, 0.0);
        assert_relative_eq!(min_y, 0.0);
        assert_relative_eq!(max_x, 100.0);
        assert_relative_eq!(max_y, 100.0);
    }
}
