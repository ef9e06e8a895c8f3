use thiserror::Error;

use crate::crs::Crs;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Coordinate frame mismatch: expected {expected}, found {found}")]
    CrsMismatch { expected: Crs, found: Crs },
    #[error("Overpass error: {0}")]
    Overpass(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Isochrone error: {0}")]
    IsochroneError(String),
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Raster error: {0}")]
    Raster(String),
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),
}
