//! Route-frequency accumulation between buildings and their nearest
//! amenity per category.
//!
//! Instead of one shortest-path query per (building, POI) pair, each
//! category runs a single multi-source Dijkstra from all of its snapped
//! POI nodes. Every graph node ends up labeled with the distance to its
//! nearest POI, that POI's input rank, and a predecessor, so both the
//! nearest-POI decision and the route itself fall out of one traversal.
//! Ties on exact distance resolve to the smaller input rank, which makes
//! the tie-break explicit and deterministic.

use std::{cmp::Ordering, collections::BinaryHeap};

use geo::LineString;
use hashbrown::HashMap;
use itertools::Itertools;
use log::{debug, info, trace};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;

use crate::LengthCost;
use crate::model::{PointRecord, StreetGraph};

/// A POI category: stable name plus its points in file order. The order
/// is significant, it decides distance ties.
#[derive(Debug, Clone)]
pub struct CategoryPois {
    pub category: String,
    pub pois: Vec<PointRecord>,
}

/// Per-node label produced by the multi-source traversal.
#[derive(Debug, Clone, Copy)]
struct NearestSeed {
    cost: LengthCost,
    rank: u32,
    predecessor: Option<NodeIndex>,
}

/// Accumulated visit counts per directed edge orientation. Both
/// orientations of an undirected edge carry the same count.
#[derive(Debug, Default)]
pub struct RouteFrequencies {
    counts: HashMap<(NodeIndex, NodeIndex), u32>,
    routes: usize,
}

impl RouteFrequencies {
    /// Visit count of the directed orientation (u, v); 0 when never
    /// traversed.
    pub fn count(&self, u: NodeIndex, v: NodeIndex) -> u32 {
        self.counts.get(&(u, v)).copied().unwrap_or(0)
    }

    /// Number of (building, category) routes accumulated.
    pub fn routes(&self) -> usize {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn record_route(&mut self, path: &[NodeIndex]) {
        for (&u, &v) in path.iter().tuple_windows() {
            *self.counts.entry((u, v)).or_insert(0) += 1;
            *self.counts.entry((v, u)).or_insert(0) += 1;
        }
        self.routes += 1;
    }
}

/// Snap every record to its nearest graph node, once. Points with no
/// candidate node (empty graph) come back as `None`.
pub fn snap_point_set(graph: &StreetGraph, records: &[PointRecord]) -> Vec<Option<NodeIndex>> {
    records
        .iter()
        .map(|record| match graph.nearest_node(&record.geometry) {
            Some((node, _)) => Some(node),
            None => {
                trace!("No nearby street node for {}", record.label());
                None
            }
        })
        .collect()
}

/// Accumulate edge visit counts for the shortest walking route from every
/// building to its nearest POI in every category. Unreachable pairs are
/// skipped; they only reduce coverage.
pub fn accumulate_route_frequencies(
    graph: &StreetGraph,
    buildings: &[PointRecord],
    categories: &[CategoryPois],
) -> RouteFrequencies {
    // Step 1: snapping, computed once per point set
    let building_nodes = snap_point_set(graph, buildings);

    // Step 2: one multi-source traversal per category
    let labels: Vec<(String, HashMap<NodeIndex, NearestSeed>)> = categories
        .par_iter()
        .map(|cat| {
            let seeds: Vec<NodeIndex> = snap_point_set(graph, &cat.pois)
                .into_iter()
                .flatten()
                .collect();
            (cat.category.clone(), multi_source_lengths(graph, &seeds))
        })
        .collect();

    // Step 3: read routes off the predecessor trees, in input order
    let mut frequencies = RouteFrequencies::default();
    for (category, tree) in &labels {
        let mut reached = 0usize;
        for building in building_nodes.iter().flatten() {
            let Some(path) = path_to_seed(tree, *building) else {
                trace!("No {category} POI reachable from building node {building:?}");
                continue;
            };
            frequencies.record_route(&path);
            reached += 1;
        }
        debug!(
            "Category {category}: routes for {reached} of {} buildings",
            building_nodes.len()
        );
    }

    info!(
        "Accumulated {} routes over {} directed edge orientations",
        frequencies.routes,
        frequencies.counts.len()
    );

    frequencies
}

#[derive(Copy, Clone, Eq, PartialEq)]
struct State {
    cost: LengthCost,
    rank: u32,
    node: NodeIndex,
}

// Min-heap by (cost, rank); the rank component keeps equal-distance ties
// deterministic in POI input order.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.cost, other.rank).cmp(&(self.cost, self.rank))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Length-weighted multi-source Dijkstra. Labels every reachable node
/// with its nearest seed by (distance, seed rank).
fn multi_source_lengths(
    graph: &StreetGraph,
    seeds: &[NodeIndex],
) -> HashMap<NodeIndex, NearestSeed> {
    let mut labels: HashMap<NodeIndex, NearestSeed> = HashMap::new();
    let mut heap = BinaryHeap::new();

    for (rank, &seed) in seeds.iter().enumerate() {
        let rank = rank as u32;
        // A node hosting several POIs keeps the first rank
        if !labels.contains_key(&seed) {
            labels.insert(
                seed,
                NearestSeed {
                    cost: 0,
                    rank,
                    predecessor: None,
                },
            );
            heap.push(State {
                cost: 0,
                rank,
                node: seed,
            });
        }
    }

    while let Some(State { cost, rank, node }) = heap.pop() {
        let current = labels[&node];
        if (cost, rank) > (current.cost, current.rank) {
            continue;
        }

        for edge in graph.edges(node) {
            let next = graph.opposite(node, edge);
            let next_cost = cost + edge.weight().length_cost();

            let better = match labels.get(&next) {
                None => true,
                Some(existing) => (next_cost, rank) < (existing.cost, existing.rank),
            };
            if better {
                labels.insert(
                    next,
                    NearestSeed {
                        cost: next_cost,
                        rank,
                        predecessor: Some(node),
                    },
                );
                heap.push(State {
                    cost: next_cost,
                    rank,
                    node: next,
                });
            }
        }
    }

    labels
}

/// Shortest route from `start` back to its nearest seed, as a node list
/// starting at `start`. `None` when the node was never reached.
fn path_to_seed(tree: &HashMap<NodeIndex, NearestSeed>, start: NodeIndex) -> Option<Vec<NodeIndex>> {
    let mut path = vec![start];
    let mut current = *tree.get(&start)?;
    while let Some(previous) = current.predecessor {
        path.push(previous);
        current = tree[&previous];
    }
    Some(path)
}

/// One output row per undirected graph edge.
#[derive(Debug, Clone)]
pub struct EdgeFrequency {
    /// OSM ids of the edge endpoints
    pub from: i64,
    pub to: i64,
    pub length: f64,
    pub route_freq: u32,
    pub geometry: LineString<f64>,
}

/// Attach accumulated counts back onto the full edge collection,
/// defaulting to zero for edges never traversed.
pub fn edge_frequency_table(
    graph: &StreetGraph,
    frequencies: &RouteFrequencies,
) -> Vec<EdgeFrequency> {
    graph
        .graph
        .edge_references()
        .map(|edge| {
            let (u, v) = (edge.source(), edge.target());
            EdgeFrequency {
                from: graph.graph[u].id,
                to: graph.graph[v].id,
                length: edge.weight().length,
                route_freq: frequencies.count(u, v),
                geometry: edge.weight().geometry.clone(),
            }
        })
        .collect()
}
