//! Analysis algorithms over the street graph.

pub mod isochrone;

pub use isochrone::{DETOUR_FACTOR, TIME_BUDGET, isochrone_cutoff, poi_isochrones, reachable_hull};
