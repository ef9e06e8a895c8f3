//! Overpass API client and query construction.

use std::time::Duration;

use geo::{Point, Rect};
use hashbrown::HashMap;
use log::debug;
use serde::Deserialize;

use crate::Error;
use crate::poi::TagGroup;

pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Tag filter for walkable ways. Excludes ways a pedestrian cannot use
/// (motorways, construction, private service roads and similar).
const WALK_FILTER: &str = concat!(
    "[\"highway\"][\"area\"!~\"yes\"]",
    "[\"highway\"!~\"abandoned|bus_guideway|construction|corridor|elevator|escalator|",
    "motor|no|planned|platform|proposed|raceway|razed\"]",
    "[\"foot\"!~\"no\"][\"service\"!~\"private\"]"
);

/// Blocking HTTP client for the Overpass interpreter endpoint. One request
/// per query, no retries; callers decide whether a failure is fatal.
pub struct OverpassClient {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl OverpassClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, Error> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("walkshed/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(180))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn query(&self, body: &str) -> Result<OverpassResponse, Error> {
        debug!("Overpass query: {body}");

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[("data", body)])
            .send()?;

        if !response.status().is_success() {
            return Err(Error::Overpass(format!(
                "interpreter returned {}",
                response.status()
            )));
        }

        Ok(response.json()?)
    }
}

/// Overpass bbox clause: south,west,north,east.
fn bbox_clause(bbox: &Rect<f64>) -> String {
    format!(
        "({},{},{},{})",
        bbox.min().y,
        bbox.min().x,
        bbox.max().y,
        bbox.max().x
    )
}

/// Query returning all walkable ways in the extent with full node geometry.
pub fn walk_network_query(bbox: &Rect<f64>) -> String {
    format!(
        "[out:json][timeout:180];(way{}{};>;);out body;",
        WALK_FILTER,
        bbox_clause(bbox)
    )
}

/// Query returning all features matching any (key, values) filter of a tag
/// group. `out center` collapses ways and relations to a representative
/// point so area features can be kept as centroids.
pub fn poi_group_query(bbox: &Rect<f64>, group: &TagGroup) -> String {
    let bbox = bbox_clause(bbox);
    let mut clauses = String::new();

    for (key, values) in &group.filters {
        let pattern = format!("^({})$", values.join("|"));
        for kind in ["node", "way", "relation"] {
            clauses.push_str(&format!("{kind}[\"{key}\"~\"{pattern}\"]{bbox};"));
        }
    }

    format!("[out:json][timeout:60];({clauses});out center;")
}

#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub id: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Present on ways/relations when queried with `out center`
    pub center: Option<Center>,
    /// Member node ids, present on ways
    #[serde(default)]
    pub nodes: Vec<i64>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl OverpassElement {
    /// Point location: own coordinates for nodes, the computed center for
    /// area features. `None` when the server returned neither.
    pub fn point(&self) -> Option<Point<f64>> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Point::new(lon, lat)),
            _ => self.center.map(|c| Point::new(c.lon, c.lat)),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.tags.get("name").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use geo::coord;

    use super::*;

    fn bbox() -> Rect<f64> {
        Rect::new(coord! { x: 9.6, y: 49.6 }, coord! { x: 9.7, y: 49.65 })
    }

    #[test]
    fn bbox_clause_is_south_west_north_east() {
        assert_eq!(bbox_clause(&bbox()), "(49.6,9.6,49.65,9.7)");
    }

    #[test]
    fn walk_query_requests_node_geometry() {
        let q = walk_network_query(&bbox());
        assert!(q.starts_with("[out:json]"));
        assert!(q.contains("way[\"highway\"]"));
        assert!(q.contains(";>;"));
    }

    #[test]
    fn poi_query_covers_all_element_kinds() {
        let group = TagGroup::new([("amenity", vec!["school", "college"])]);
        let q = poi_group_query(&bbox(), &group);
        assert!(q.contains("node[\"amenity\"~\"^(school|college)$\"]"));
        assert!(q.contains("way[\"amenity\"~\"^(school|college)$\"]"));
        assert!(q.contains("relation[\"amenity\"~\"^(school|college)$\"]"));
        assert!(q.ends_with("out center;"));
    }

    #[test]
    fn element_point_prefers_own_coordinates() {
        let node: OverpassElement = serde_json::from_value(serde_json::json!({
            "type": "node", "id": 1, "lat": 49.62, "lon": 9.66,
            "tags": {"name": "Marktplatz"}
        }))
        .unwrap();
        let p = node.point().unwrap();
        assert!((p.x() - 9.66).abs() < 1e-12);
        assert_eq!(node.name(), Some("Marktplatz"));

        let way: OverpassElement = serde_json::from_value(serde_json::json!({
            "type": "way", "id": 2, "center": {"lat": 49.0, "lon": 9.0},
            "nodes": [1, 2, 3]
        }))
        .unwrap();
        assert!((way.point().unwrap().y() - 49.0).abs() < 1e-12);

        let bare: OverpassElement =
            serde_json::from_value(serde_json::json!({"type": "relation", "id": 3})).unwrap();
        assert!(bare.point().is_none());
    }
}
