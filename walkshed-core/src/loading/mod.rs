//! This module is responsible for querying map data from the Overpass API
//! and building the pedestrian street graph from the response.

mod builder;
pub mod overpass;

pub use builder::street_graph_from_overpass;
pub use overpass::{OverpassClient, OverpassElement, OverpassResponse};
