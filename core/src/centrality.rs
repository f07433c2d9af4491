//! Node rankings: degree, capitalization, extreme-degree vertices and
//! pivot-sampled betweenness.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::config::check_percentage;
use crate::error::Result;
use crate::graph::{Graph, NodeId};

/// Degree information for a single node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreeResult {
    pub node_id: NodeId,
    pub label: String,
    pub out_degree: u32,
    pub in_degree: u32,
    pub total_degree: u32,
}

/// Return nodes ranked by degree (total connections).
///
/// If `top_n` is 0, returns all nodes. Otherwise returns the top N by
/// total degree (descending). Ties are broken by node ID (ascending).
pub fn degree_centrality(graph: &Graph, top_n: usize) -> Vec<DegreeResult> {
    let mut results: Vec<DegreeResult> = graph
        .nodes()
        .map(|id| {
            let out_degree = graph.out_edges(id).len() as u32;
            let in_degree = graph.in_edges(id).len() as u32;
            DegreeResult {
                node_id: id,
                label: graph.label(id).map(str::to_string).unwrap_or_default(),
                out_degree,
                in_degree,
                total_degree: out_degree + in_degree,
            }
        })
        .collect();

    // Sort by total degree descending, then by node_id ascending for stability
    results.sort_by(|a, b| {
        b.total_degree
            .cmp(&a.total_degree)
            .then(a.node_id.cmp(&b.node_id))
    });

    if top_n > 0 && top_n < results.len() {
        results.truncate(top_n);
    }

    results
}

/// Capitalization of every node: the sum of its incoming edge weights
/// (the market value held in it across all holders).
pub fn capitalization(graph: &Graph) -> HashMap<NodeId, f64> {
    graph
        .nodes()
        .map(|id| (id, graph.in_edges(id).iter().map(|e| e.weight).sum()))
        .collect()
}

/// The `k` nodes with the highest score, best first. Ties go to the lower id.
pub fn top_k(scores: &HashMap<NodeId, f64>, k: usize) -> Vec<NodeId> {
    let mut ranked: Vec<(NodeId, f64)> = scores.iter().map(|(&id, &s)| (id, s)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(k).map(|(id, _)| id).collect()
}

/// Node with the most outgoing edges. Ties go to the lower id.
pub fn max_out_degree_node(graph: &Graph) -> Option<NodeId> {
    extreme_by(graph, |id| graph.out_edges(id).len(), Ordering::Greater)
}

/// Node with the most incoming edges. Ties go to the lower id.
pub fn max_in_degree_node(graph: &Graph) -> Option<NodeId> {
    extreme_by(graph, |id| graph.in_edges(id).len(), Ordering::Greater)
}

/// Node with the fewest incoming edges. Ties go to the lower id.
pub fn min_in_degree_node(graph: &Graph) -> Option<NodeId> {
    extreme_by(graph, |id| graph.in_edges(id).len(), Ordering::Less)
}

fn extreme_by<F>(graph: &Graph, key: F, wanted: Ordering) -> Option<NodeId>
where
    F: Fn(NodeId) -> usize,
{
    graph.nodes().fold(None, |best: Option<(NodeId, usize)>, id| {
        let value = key(id);
        match best {
            Some((_, best_value)) if value.cmp(&best_value) != wanted => best,
            _ => Some((id, value)),
        }
    })
    .map(|(id, _)| id)
}

/// Heap entry ordered so that `BinaryHeap` pops the smallest distance first.
#[derive(Debug, Clone, Copy)]
struct Tentative {
    dist: f64,
    node: NodeId,
}

impl PartialEq for Tentative {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Tentative {}

impl PartialOrd for Tentative {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tentative {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Approximate betweenness centrality (Brandes, weighted, directed).
///
/// Single-source dependencies are accumulated from ⌊n · percentage⌋
/// uniformly sampled pivot nodes and scaled by n / pivots. With
/// `normalized`, scores are divided by (n-1)(n-2). Fails with
/// `InvalidArgument` when `percentage` is outside [0, 1]; with no pivots
/// every score is 0.0. Edge weights are assumed non-negative.
pub fn approximate_betweenness<R: Rng + ?Sized>(
    graph: &Graph,
    percentage: f64,
    normalized: bool,
    rng: &mut R,
) -> Result<HashMap<NodeId, f64>> {
    check_percentage(percentage)?;

    let n = graph.node_count();
    let pivots = (n as f64 * percentage).floor() as usize;
    let mut betweenness = vec![0.0_f64; n];

    if pivots > 0 {
        let sources: Vec<NodeId> = if pivots >= n {
            graph.nodes().collect()
        } else {
            rand::seq::index::sample(rng, n, pivots).into_vec()
        };
        debug!(nodes = n, pivots = sources.len(), "sampled betweenness pivots");

        for s in sources {
            accumulate_from(graph, s, &mut betweenness);
        }

        let mut scale = 1.0;
        if normalized && n > 2 {
            scale /= ((n - 1) * (n - 2)) as f64;
        }
        if pivots < n {
            scale *= n as f64 / pivots as f64;
        }
        for b in &mut betweenness {
            *b *= scale;
        }
    }

    Ok(graph.nodes().zip(betweenness).collect())
}

/// One Brandes pass: Dijkstra from `source`, then back-propagate
/// dependencies in reverse settlement order.
fn accumulate_from(graph: &Graph, source: NodeId, betweenness: &mut [f64]) {
    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut sigma = vec![0.0_f64; n];
    let mut settled = vec![false; n];
    let mut predecessors: Vec<Vec<NodeId>> = vec![Vec::new(); n];
    let mut order: Vec<NodeId> = Vec::with_capacity(n);
    let mut heap = BinaryHeap::new();

    dist[source] = 0.0;
    sigma[source] = 1.0;
    heap.push(Tentative {
        dist: 0.0,
        node: source,
    });

    while let Some(Tentative { dist: d, node: v }) = heap.pop() {
        if settled[v] || d > dist[v] {
            continue;
        }
        settled[v] = true;
        order.push(v);

        for edge in graph.out_edges(v) {
            let w = edge.target;
            if settled[w] {
                continue;
            }
            let candidate = d + edge.weight;
            if candidate < dist[w] {
                dist[w] = candidate;
                sigma[w] = sigma[v];
                predecessors[w].clear();
                predecessors[w].push(v);
                heap.push(Tentative {
                    dist: candidate,
                    node: w,
                });
            } else if candidate == dist[w] {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    let mut delta = vec![0.0_f64; n];
    for &w in order.iter().rev() {
        for &v in &predecessors[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
        if w != source {
            betweenness[w] += delta[w];
        }
    }
}
