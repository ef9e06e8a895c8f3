//! Scanline polygon rasterization.

use geo::{BoundingRect, LineString, Polygon};
use ndarray::Array2;

use super::transform::GridTransform;

/// Rasterize polygons into a binary presence grid: a cell is set when its
/// center falls inside any polygon (even-odd rule, holes respected).
pub fn rasterize_presence(
    polygons: &[Polygon<f64>],
    transform: &GridTransform,
    rows: usize,
    cols: usize,
) -> Array2<u8> {
    let mut grid = Array2::zeros((rows, cols));

    for polygon in polygons {
        let Some(rect) = polygon.bounding_rect() else {
            continue;
        };

        // Rows whose center y lies inside the polygon's vertical extent
        let row_start = transform.row_of(rect.max().y).floor().max(0.0) as usize;
        let row_end = transform.row_of(rect.min().y).ceil().min(rows as f64) as usize;

        for row in row_start..row_end {
            let (_, y) = transform.cell_center(0, row);
            let mut crossings = ring_crossings(polygon.exterior(), y);
            for interior in polygon.interiors() {
                crossings.extend(ring_crossings(interior, y));
            }
            crossings.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            // Even-odd fill between crossing pairs
            for pair in crossings.chunks_exact(2) {
                let (x0, x1) = (pair[0], pair[1]);
                // Smallest column whose center is >= x0, first whose center is >= x1
                let col_start = (transform.col_of(x0) - 0.5).ceil().max(0.0) as usize;
                let col_end = (transform.col_of(x1) - 0.5).ceil().min(cols as f64) as usize;
                for col in col_start..col_end {
                    grid[[row, col]] = 1;
                }
            }
        }
    }

    grid
}

/// X coordinates where a ring crosses the horizontal line at `y`.
/// Horizontal segments never cross; shared vertices count once.
fn ring_crossings(ring: &LineString<f64>, y: f64) -> Vec<f64> {
    ring.lines()
        .filter(|line| (line.start.y > y) != (line.end.y > y))
        .map(|line| {
            let t = (y - line.start.y) / (line.end.y - line.start.y);
            line.start.x + t * (line.end.x - line.start.x)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn unit_square(x0: f64, y0: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + 1.0, y: y0),
            (x: x0 + 1.0, y: y0 + 1.0),
            (x: x0, y: y0 + 1.0),
            (x: x0, y: y0),
        ]
    }

    #[test]
    fn non_overlapping_squares_cover_exactly_their_cells() {
        // Four disjoint unit squares on a 4x4 grid at 0.5 resolution:
        // each square covers 4 cells, sum must be 16.
        let polygons = vec![
            unit_square(0.0, 0.0),
            unit_square(1.0, 0.0),
            unit_square(0.0, 1.0),
            unit_square(1.0, 1.0),
        ];
        let transform = GridTransform::new(0.0, 2.0, 0.5);
        let grid = rasterize_presence(&polygons, &transform, 4, 4);
        let sum: u32 = grid.iter().map(|&v| u32::from(v)).sum();
        assert_eq!(sum, 16);
    }

    #[test]
    fn single_square_at_matching_resolution() {
        let polygons = vec![unit_square(0.0, 0.0)];
        let transform = GridTransform::new(0.0, 2.0, 0.5);
        let grid = rasterize_presence(&polygons, &transform, 4, 4);
        let sum: u32 = grid.iter().map(|&v| u32::from(v)).sum();
        assert_eq!(sum, 4);
        // The covered cells are the bottom-left quadrant
        assert_eq!(grid[[2, 0]], 1);
        assert_eq!(grid[[3, 1]], 1);
        assert_eq!(grid[[0, 0]], 0);
        assert_eq!(grid[[3, 3]], 0);
    }

    #[test]
    fn hole_is_left_empty() {
        let with_hole = Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (3.0, 0.0),
                (3.0, 3.0),
                (0.0, 3.0),
                (0.0, 0.0),
            ]),
            vec![LineString::from(vec![
                (1.0, 1.0),
                (2.0, 1.0),
                (2.0, 2.0),
                (1.0, 2.0),
                (1.0, 1.0),
            ])],
        );
        let transform = GridTransform::new(0.0, 3.0, 1.0);
        let grid = rasterize_presence(&[with_hole], &transform, 3, 3);
        assert_eq!(grid[[1, 1]], 0);
        let sum: u32 = grid.iter().map(|&v| u32::from(v)).sum();
        assert_eq!(sum, 8);
    }

    #[test]
    fn polygon_outside_the_grid_is_clamped() {
        let polygons = vec![unit_square(10.0, 10.0)];
        let transform = GridTransform::new(0.0, 2.0, 0.5);
        let grid = rasterize_presence(&polygons, &transform, 4, 4);
        assert_eq!(grid.iter().map(|&v| u32::from(v)).sum::<u32>(), 0);
    }

    #[test]
    fn degenerate_polygon_covers_nothing() {
        let degenerate = polygon![
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 1.0),
        ];
        let transform = GridTransform::new(0.0, 2.0, 0.5);
        let grid = rasterize_presence(&[degenerate], &transform, 4, 4);
        assert_eq!(grid.iter().map(|&v| u32::from(v)).sum::<u32>(), 0);
    }
}
