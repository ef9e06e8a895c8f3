//! Coverage raster: grid georeferencing, polygon rasterization, layer
//! stacking and GeoTIFF output.

mod coverage;
mod geotiff;
mod rasterize;
mod transform;

pub use coverage::{PolygonLayer, stack_coverage};
pub use geotiff::write_geotiff;
pub use rasterize::rasterize_presence;
pub use transform::GridTransform;

use ndarray::Array2;

use crate::crs::Crs;

/// A single-band grid of unsigned overlap counts with georeferencing
/// metadata.
#[derive(Debug, Clone)]
pub struct Raster {
    data: Array2<u32>,
    transform: GridTransform,
    crs: Crs,
    nodata: u32,
}

impl Raster {
    pub fn zeros(rows: usize, cols: usize, transform: GridTransform, crs: Crs) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            transform,
            crs,
            nodata: 0,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        let s = self.data.dim();
        (s.0, s.1)
    }

    pub fn data(&self) -> &Array2<u32> {
        &self.data
    }

    pub fn transform(&self) -> &GridTransform {
        &self.transform
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn nodata(&self) -> u32 {
        self.nodata
    }

    /// Add a binary presence grid of the same shape into the counts.
    pub fn add_presence(&mut self, presence: &Array2<u8>) {
        debug_assert_eq!(self.data.dim(), presence.dim());
        self.data.zip_mut_with(presence, |count, &hit| {
            *count += u32::from(hit);
        });
    }

    pub fn cell_sum(&self) -> u64 {
        self.data.iter().map(|&v| u64::from(v)).sum()
    }

    pub fn max_count(&self) -> u32 {
        self.data.iter().copied().max().unwrap_or(0)
    }
}
