//! Pedestrian accessibility analysis over OpenStreetMap street networks.
//!
//! The crate covers four pipeline stages that communicate through files:
//! POI retrieval from the Overpass API, walking isochrone generation,
//! isochrone coverage rasterization, and route-frequency accumulation
//! between buildings and their nearest amenities.

pub mod algo;
pub mod crs;
pub mod error;
pub mod io;
pub mod loading;
pub mod model;
pub mod poi;
pub mod prelude;
pub mod raster;
pub mod routing;

pub use error::Error;

/// Walking time in seconds.
pub type Time = u32;

/// Path length cost in centimetres. Edge lengths are quantized so that
/// Dijkstra states stay integral and totally ordered.
pub type LengthCost = u32;
