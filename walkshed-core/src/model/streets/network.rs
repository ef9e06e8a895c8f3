//! Street graph with a spatial index for nearest-node snapping.

use geo::Point;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::GeomWithData;

use super::components::{StreetEdge, StreetNode};
use crate::crs::{Crs, project};

/// Node location indexed by the R-tree, tagged with its graph index.
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;

/// Undirected pedestrian network with node coordinates in a single
/// explicit coordinate frame.
#[derive(Debug, Clone)]
pub struct StreetGraph {
    pub graph: UnGraph<StreetNode, StreetEdge>,
    rtree: RTree<IndexedPoint>,
    crs: Crs,
}

impl StreetGraph {
    pub fn new(graph: UnGraph<StreetNode, StreetEdge>, crs: Crs) -> Self {
        let rtree = build_rtree(&graph);
        Self { graph, rtree, crs }
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edges incident to a node. For the undirected graph the stored
    /// orientation is arbitrary; callers resolve the far endpoint with
    /// [`Self::opposite`].
    pub fn edges(
        &self,
        node: NodeIndex,
    ) -> impl Iterator<Item = petgraph::graph::EdgeReference<'_, StreetEdge>> {
        self.graph.edges(node)
    }

    /// The endpoint of `edge` that is not `node`.
    pub fn opposite(
        &self,
        node: NodeIndex,
        edge: petgraph::graph::EdgeReference<'_, StreetEdge>,
    ) -> NodeIndex {
        if edge.source() == node {
            edge.target()
        } else {
            edge.source()
        }
    }

    pub fn node_point(&self, node: NodeIndex) -> Option<Point<f64>> {
        self.graph.node_weight(node).map(|n| n.geometry)
    }

    /// Snap a point to the nearest graph node by straight-line proximity in
    /// the graph's frame. Returns the node and the squared frame distance.
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, f64)> {
        self.rtree
            .nearest_neighbor(&[point.x(), point.y()])
            .map(|indexed| {
                let [x, y] = *indexed.geom();
                let (dx, dy) = (x - point.x(), y - point.y());
                (indexed.data, dx * dx + dy * dy)
            })
    }

    /// Reproject the whole network (nodes, edge geometry, spatial index)
    /// into another frame.
    pub fn to_crs(&self, target: Crs) -> StreetGraph {
        if target == self.crs {
            return self.clone();
        }

        let projected = self.graph.map(
            |_, node| StreetNode {
                id: node.id,
                geometry: project(&node.geometry, self.crs, target),
            },
            |_, edge| StreetEdge {
                length: edge.length,
                speed: edge.speed,
                travel_time: edge.travel_time,
                geometry: project(&edge.geometry, self.crs, target),
            },
        );

        StreetGraph::new(projected, target)
    }
}

fn build_rtree(graph: &UnGraph<StreetNode, StreetEdge>) -> RTree<IndexedPoint> {
    let points: Vec<IndexedPoint> = graph
        .node_indices()
        .map(|idx| {
            let p = graph[idx].geometry;
            IndexedPoint::new([p.x(), p.y()], idx)
        })
        .collect();

    RTree::bulk_load(points)
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Point};

    use super::*;

    fn grid_graph() -> StreetGraph {
        let mut graph = UnGraph::<StreetNode, StreetEdge>::new_undirected();
        let a = graph.add_node(StreetNode {
            id: 1,
            geometry: Point::new(0.0, 0.0),
        });
        let b = graph.add_node(StreetNode {
            id: 2,
            geometry: Point::new(100.0, 0.0),
        });
        graph.add_edge(
            a,
            b,
            StreetEdge {
                length: 100.0,
                speed: 4.8,
                travel_time: 75,
                geometry: LineString::from(vec![(0.0, 0.0), (100.0, 0.0)]),
            },
        );
        StreetGraph::new(
            graph,
            Crs::Utm {
                zone: 32,
                north: true,
            },
        )
    }

    #[test]
    fn snapping_is_deterministic_and_idempotent() {
        let graph = grid_graph();
        let probe = Point::new(30.0, 10.0);

        let first = graph.nearest_node(&probe).unwrap();
        for _ in 0..5 {
            assert_eq!(graph.nearest_node(&probe).unwrap(), first);
        }
        assert_eq!(graph.graph[first.0].id, 1);
        assert!((first.1 - (30.0 * 30.0 + 10.0 * 10.0)).abs() < 1e-9);
    }

    #[test]
    fn empty_graph_has_no_nearest_node() {
        let graph = StreetGraph::new(UnGraph::new_undirected(), Crs::Wgs84);
        assert!(graph.nearest_node(&Point::new(0.0, 0.0)).is_none());
    }
}
