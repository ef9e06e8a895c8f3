//! Data model for the pedestrian street network and the point sets
//! (POIs, building centroids) moving through the pipeline.

pub mod streets;

pub use streets::network::{IndexedPoint, StreetGraph};
pub use streets::{StreetEdge, StreetNode};

use geo::Point;

/// A named point feature read from or written to a vector file.
#[derive(Debug, Clone)]
pub struct PointRecord {
    /// Feature name, when the source carried one
    pub name: Option<String>,
    pub geometry: Point<f64>,
}

impl PointRecord {
    pub fn new(name: Option<String>, geometry: Point<f64>) -> Self {
        Self { name, geometry }
    }

    /// Display label, falling back like the upstream data often requires.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}
