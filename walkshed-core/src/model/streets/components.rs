//! Street network components - nodes and edges

use geo::{LineString, Point};

use crate::{LengthCost, Time};

/// Street graph node
#[derive(Debug, Clone)]
pub struct StreetNode {
    /// OSM ID of the node
    pub id: i64,
    /// Node coordinates, in the graph's frame
    pub geometry: Point<f64>,
}

/// Street graph edge (street segment)
#[derive(Debug, Clone)]
pub struct StreetEdge {
    /// Segment length in metres
    pub length: f64,
    /// Estimated walking speed in km/h
    pub speed: f64,
    /// Derived pedestrian travel time in seconds
    pub travel_time: Time,
    /// Segment geometry for output and visualization
    pub geometry: LineString<f64>,
}

impl StreetEdge {
    /// Length quantized to centimetres for integral shortest-path costs.
    pub fn length_cost(&self) -> LengthCost {
        (self.length * 100.0).round() as LengthCost
    }
}
