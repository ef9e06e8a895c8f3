use std::{cmp::Ordering, collections::BinaryHeap};

use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use crate::LengthCost;
use crate::model::StreetGraph;

#[derive(Copy, Clone, Eq, PartialEq)]
struct State {
    cost: LengthCost,
    node: NodeIndex,
}

// Min-heap by cost (reversed from standard Rust BinaryHeap)
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.cmp(&self.cost)
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra over edge lengths, bounded by `max_cost` centimetres.
/// Returns a map of reached node indices to walked lengths.
pub fn dijkstra_lengths(
    graph: &StreetGraph,
    start: NodeIndex,
    max_cost: Option<LengthCost>,
) -> HashMap<NodeIndex, LengthCost> {
    let mut distances: HashMap<NodeIndex, LengthCost> = HashMap::new();
    let mut heap = BinaryHeap::new();

    heap.push(State {
        cost: 0,
        node: start,
    });
    distances.insert(start, 0);

    while let Some(State { cost, node }) = heap.pop() {
        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node) {
            if cost > best {
                continue;
            }
        }

        // Everything still on the heap is at least this expensive
        if let Some(max) = max_cost {
            if cost > max {
                break;
            }
        }

        for edge in graph.edges(node) {
            let next = graph.opposite(node, edge);
            let next_cost = cost + edge.weight().length_cost();

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    if let Some(max) = max_cost {
        distances.retain(|_, &mut cost| cost <= max);
    }

    distances
}
