//! Shortest-path routines over the street graph.

pub mod dijkstra;
pub mod frequency;

pub use dijkstra::dijkstra_lengths;
pub use frequency::{
    CategoryPois, EdgeFrequency, RouteFrequencies, accumulate_route_frequencies,
    edge_frequency_table,
};
