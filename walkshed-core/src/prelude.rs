// Re-export key components
pub use crate::algo::isochrone::{DETOUR_FACTOR, TIME_BUDGET, isochrone_cutoff, poi_isochrones};
pub use crate::crs::{Crs, estimate_utm, project};
pub use crate::loading::{OverpassClient, street_graph_from_overpass};
pub use crate::model::{PointRecord, StreetGraph};
pub use crate::poi::{TagGroup, default_taxonomy, retrieve_pois};
pub use crate::raster::{GridTransform, Raster, stack_coverage, write_geotiff};
pub use crate::routing::frequency::{
    CategoryPois, RouteFrequencies, accumulate_route_frequencies, edge_frequency_table,
};

pub use crate::Error;
pub use crate::Time;
