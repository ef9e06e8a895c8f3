//! Stacking isochrone layers into one overlap-count raster.

use geo::{BoundingRect, Polygon};
use log::{debug, info};

use super::rasterize::rasterize_presence;
use super::transform::GridTransform;
use super::Raster;
use crate::Error;
use crate::crs::{Crs, estimate_utm, project, require_same_frame};

/// One polygon collection read from disk, tagged with its frame.
#[derive(Debug, Clone)]
pub struct PolygonLayer {
    /// Source label, usually the file stem
    pub name: String,
    pub polygons: Vec<Polygon<f64>>,
    pub crs: Crs,
}

/// Rasterize every layer at the given resolution and sum the binary
/// presence grids into a single coverage raster.
///
/// When the first layer is geographic, a UTM frame is estimated from its
/// extent and all layers are reprojected into it before gridding.
/// Degenerate extents are floored to a one-cell grid.
pub fn stack_coverage(layers: &[PolygonLayer], resolution: f64) -> Result<Raster, Error> {
    if layers.is_empty() {
        return Err(Error::InvalidData(
            "no isochrone layers to rasterize".to_string(),
        ));
    }
    if resolution <= 0.0 {
        return Err(Error::Raster(format!("invalid resolution {resolution}")));
    }

    let target = metric_frame(&layers[0])?;
    // Geographic layers are reprojected; projected layers must already
    // share the output frame.
    for layer in layers {
        if !layer.crs.is_geographic() {
            require_same_frame(target, layer.crs)?;
        }
    }

    let projected: Vec<PolygonLayer> = layers
        .iter()
        .map(|layer| PolygonLayer {
            name: layer.name.clone(),
            polygons: layer
                .polygons
                .iter()
                .map(|p| project(p, layer.crs, target))
                .collect(),
            crs: target,
        })
        .collect();

    let (min_x, min_y, max_x, max_y) = union_bounds(&projected)?;
    let cols = (((max_x - min_x) / resolution) as usize).max(1);
    let rows = (((max_y - min_y) / resolution) as usize).max(1);

    info!(
        "Projected bounds: minx={min_x}, miny={min_y}, maxx={max_x}, maxy={max_y}; \
         raster size: {cols}x{rows} at {resolution}"
    );

    let transform = GridTransform::new(min_x, max_y, resolution);
    let mut raster = Raster::zeros(rows, cols, transform, target);

    for layer in &projected {
        let presence = rasterize_presence(&layer.polygons, &transform, rows, cols);
        raster.add_presence(&presence);
        debug!("Rasterized layer {}", layer.name);
    }

    Ok(raster)
}

/// Metric frame for the output grid: the first layer's own frame when it
/// is already projected, otherwise a UTM zone estimated from its extent.
fn metric_frame(first: &PolygonLayer) -> Result<Crs, Error> {
    if !first.crs.is_geographic() {
        return Ok(first.crs);
    }

    let rect = first
        .polygons
        .iter()
        .filter_map(|p| p.bounding_rect())
        .reduce(merge_rects)
        .ok_or_else(|| Error::InvalidData(format!("layer {} has no geometry", first.name)))?;

    let center = rect.center();
    let target = estimate_utm(center.x, center.y);
    info!("Reprojecting layers to a metric frame: {target}");
    Ok(target)
}

fn union_bounds(layers: &[PolygonLayer]) -> Result<(f64, f64, f64, f64), Error> {
    layers
        .iter()
        .flat_map(|layer| layer.polygons.iter())
        .filter_map(|p| p.bounding_rect())
        .reduce(merge_rects)
        .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
        .ok_or_else(|| Error::InvalidData("layers contain no geometry".to_string()))
}

fn merge_rects(a: geo::Rect<f64>, b: geo::Rect<f64>) -> geo::Rect<f64> {
    geo::Rect::new(
        geo::coord! {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        geo::coord! {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]
    }

    fn metric_layer(name: &str, polygons: Vec<Polygon<f64>>) -> PolygonLayer {
        PolygonLayer {
            name: name.to_string(),
            polygons,
            crs: Crs::Utm {
                zone: 32,
                north: true,
            },
        }
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            stack_coverage(&[], 1.0),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn overlapping_layers_sum_counts() {
        let layers = vec![
            metric_layer("a", vec![square(0.0, 0.0, 10.0)]),
            metric_layer("b", vec![square(5.0, 0.0, 10.0)]),
        ];
        let raster = stack_coverage(&layers, 1.0).unwrap();
        assert_eq!(raster.shape(), (10, 15));
        assert_eq!(raster.max_count(), 2);
        // 10x10 each, overlapping on a 5x10 strip
        assert_eq!(raster.cell_sum(), 200);
    }

    #[test]
    fn mixed_projected_frames_are_an_error() {
        let mut other = metric_layer("b", vec![square(0.0, 0.0, 10.0)]);
        other.crs = Crs::Utm {
            zone: 33,
            north: true,
        };
        let layers = vec![metric_layer("a", vec![square(0.0, 0.0, 10.0)]), other];
        assert!(matches!(
            stack_coverage(&layers, 1.0),
            Err(Error::CrsMismatch { .. })
        ));
    }

    #[test]
    fn degenerate_extent_floors_to_one_cell() {
        let layers = vec![metric_layer("dot", vec![square(0.0, 0.0, 0.25)])];
        let raster = stack_coverage(&layers, 1.0).unwrap();
        assert_eq!(raster.shape(), (1, 1));
    }

    #[test]
    fn geographic_layers_are_projected_to_utm() {
        // ~0.01 deg square near Tauberbischofsheim, roughly 720x1100 m
        let layers = vec![PolygonLayer {
            name: "iso".to_string(),
            polygons: vec![square(9.65, 49.61, 0.01)],
            crs: Crs::Wgs84,
        }];
        let raster = stack_coverage(&layers, 100.0).unwrap();
        assert_eq!(raster.crs().epsg(), 32632);
        let (rows, cols) = raster.shape();
        assert!(rows >= 10 && rows <= 12, "rows {rows}");
        assert!(cols >= 6 && cols <= 8, "cols {cols}");
        assert!(raster.cell_sum() > 0);
    }
}
