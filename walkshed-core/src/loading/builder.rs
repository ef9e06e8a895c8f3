//! Street graph construction from an Overpass response.

use geo::{Distance, Haversine, LineString, Point};
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use log::{info, trace};
use petgraph::graph::{NodeIndex, UnGraph};

use crate::crs::Crs;
use crate::model::{StreetEdge, StreetGraph, StreetNode};
use crate::{Error, Time};

use super::overpass::{ElementKind, OverpassResponse};

/// Assumed pedestrian speed, used to derive edge travel times.
pub const WALKING_SPEED_KMH: f64 = 4.8;

/// Build the undirected walking graph from a walk-network Overpass
/// response. Every consecutive node pair along a way becomes one edge
/// annotated with haversine length, walking speed and derived travel time.
pub fn street_graph_from_overpass(response: &OverpassResponse) -> Result<StreetGraph, Error> {
    let coords: HashMap<i64, Point<f64>> = response
        .elements
        .iter()
        .filter(|e| e.kind == ElementKind::Node)
        .filter_map(|e| e.point().map(|p| (e.id, p)))
        .collect();

    if coords.is_empty() {
        return Err(Error::InvalidData(
            "Overpass response contains no nodes".to_string(),
        ));
    }

    let mut graph = UnGraph::<StreetNode, StreetEdge>::new_undirected();
    let mut node_indices: HashMap<i64, NodeIndex> = HashMap::new();
    let mut seen_segments: HashSet<(i64, i64)> = HashSet::new();

    let mut node_index = |graph: &mut UnGraph<StreetNode, StreetEdge>, id: i64| {
        let geometry = coords[&id];
        *node_indices
            .entry(id)
            .or_insert_with(|| graph.add_node(StreetNode { id, geometry }))
    };

    for way in response
        .elements
        .iter()
        .filter(|e| e.kind == ElementKind::Way)
    {
        for (&from_id, &to_id) in way.nodes.iter().tuple_windows() {
            if from_id == to_id {
                continue;
            }
            if !coords.contains_key(&from_id) || !coords.contains_key(&to_id) {
                trace!("Way {} references a node outside the extent", way.id);
                continue;
            }
            // Ways sharing a segment would otherwise produce parallel edges
            let key = (from_id.min(to_id), from_id.max(to_id));
            if !seen_segments.insert(key) {
                continue;
            }

            let from = node_index(&mut graph, from_id);
            let to = node_index(&mut graph, to_id);
            let (a, b) = (coords[&from_id], coords[&to_id]);
            graph.add_edge(from, to, segment_edge(a, b));
        }
    }

    info!(
        "Street graph built: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(StreetGraph::new(graph, Crs::Wgs84))
}

fn segment_edge(a: Point<f64>, b: Point<f64>) -> StreetEdge {
    let length = Haversine.distance(a, b);
    StreetEdge {
        length,
        speed: WALKING_SPEED_KMH,
        travel_time: travel_time(length, WALKING_SPEED_KMH),
        geometry: LineString::from(vec![a, b]),
    }
}

/// Travel time in whole seconds for a segment at the given speed.
fn travel_time(length_m: f64, speed_kmh: f64) -> Time {
    let speed_mps = speed_kmh / 3.6;
    (length_m / speed_mps).round() as Time
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: serde_json::Value) -> OverpassResponse {
        serde_json::from_value(json).unwrap()
    }

    fn sample() -> OverpassResponse {
        response(serde_json::json!({
            "elements": [
                {"type": "node", "id": 1, "lat": 49.0, "lon": 9.0},
                {"type": "node", "id": 2, "lat": 49.0, "lon": 9.001},
                {"type": "node", "id": 3, "lat": 49.001, "lon": 9.001},
                {"type": "way", "id": 10, "nodes": [1, 2, 3]},
                // shares the 1-2 segment with way 10
                {"type": "way", "id": 11, "nodes": [2, 1]},
                // dangling reference outside the extent
                {"type": "way", "id": 12, "nodes": [3, 99]}
            ]
        }))
    }

    #[test]
    fn builds_undirected_graph_without_duplicate_segments() {
        let graph = street_graph_from_overpass(&sample()).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn edge_lengths_and_times_are_plausible() {
        let graph = street_graph_from_overpass(&sample()).unwrap();
        for edge in graph.graph.edge_weights() {
            // ~0.001 deg of longitude at 49N is roughly 73 m
            assert!(edge.length > 50.0 && edge.length < 150.0, "{}", edge.length);
            let expected = (edge.length / (WALKING_SPEED_KMH / 3.6)).round() as Time;
            assert_eq!(edge.travel_time, expected);
            assert!(edge.travel_time > 0);
        }
    }

    #[test]
    fn empty_response_is_invalid() {
        let err = street_graph_from_overpass(&response(serde_json::json!({"elements": []})));
        assert!(matches!(err, Err(Error::InvalidData(_))));
    }
}
