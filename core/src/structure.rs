use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::debug;

use crate::error::Result;
use crate::graph::{Graph, NodeId};

/// Maximal induced subgraph in which every node has total degree
/// (in + out, counted inside the core) of at least `k`.
///
/// Computed by repeatedly peeling nodes whose degree is below `k`.
/// Self-loops do not count toward a node's degree.
pub fn k_core(graph: &Graph, k: usize) -> Result<Graph> {
    let n = graph.node_count();
    let mut degree: Vec<usize> = graph
        .nodes()
        .map(|id| {
            let out = graph.out_edges(id).iter().filter(|e| e.target != id).count();
            let inc = graph.in_edges(id).iter().filter(|e| e.target != id).count();
            out + inc
        })
        .collect();
    let mut removed = vec![false; n];
    let mut queue: VecDeque<NodeId> = graph.nodes().filter(|&id| degree[id] < k).collect();
    for &id in &queue {
        removed[id] = true;
    }

    while let Some(node) = queue.pop_front() {
        let touching = graph
            .out_edges(node)
            .iter()
            .chain(graph.in_edges(node).iter())
            .map(|e| e.target)
            .filter(|&other| other != node);
        for other in touching {
            if removed[other] {
                continue;
            }
            degree[other] -= 1;
            if degree[other] < k {
                removed[other] = true;
                queue.push_back(other);
            }
        }
    }

    let core: Vec<NodeId> = graph.nodes().filter(|&id| !removed[id]).collect();
    debug!(k, nodes = n, core = core.len(), "computed k-core");
    graph.induced_subgraph(&core)
}

/// Weighted clustering coefficient of every node, directed formulation.
///
/// Weights are scaled by the largest edge weight in the graph. Between two
/// nodes `u` and `v` the pair strength is `cbrt(w(u,v)) + cbrt(w(v,u))`
/// (absent edges contribute nothing), so each triangle counts the geometric
/// mean of its scaled weights once per orientation of its three edges. For
/// node `i` the triangle sum is divided by
/// `2 * (d_tot * (d_tot - 1) - 2 * d_bi)`, where `d_tot` is in + out degree
/// and `d_bi` the number of reciprocated neighbours. Self-loops are ignored.
///
/// Nodes with fewer than two neighbours score 0.0, as does every node when
/// the graph has no positive edge weight.
pub fn clustering_coefficient(graph: &Graph) -> HashMap<NodeId, f64> {
    let max_weight = graph
        .nodes()
        .flat_map(|id| graph.out_edges(id))
        .map(|e| e.weight)
        .fold(f64::NEG_INFINITY, f64::max);
    if max_weight <= 0.0 {
        return graph.nodes().map(|id| (id, 0.0)).collect();
    }

    let strength = |u: NodeId, v: NodeId| -> f64 {
        [(u, v), (v, u)]
            .into_iter()
            .filter_map(|(from, to)| graph.edge_weight(from, to).ok())
            .map(|w| (w / max_weight).cbrt())
            .sum()
    };

    let scores: HashMap<NodeId, f64> = graph
        .nodes()
        .map(|i| {
            let preds: BTreeSet<NodeId> = graph
                .in_edges(i)
                .iter()
                .map(|e| e.target)
                .filter(|&j| j != i)
                .collect();
            let succs: BTreeSet<NodeId> = graph
                .out_edges(i)
                .iter()
                .map(|e| e.target)
                .filter(|&j| j != i)
                .collect();
            let neighbours: Vec<NodeId> = preds.union(&succs).copied().collect();
            if neighbours.len() < 2 {
                return (i, 0.0);
            }

            let mut triangles = 0.0;
            for (pos, &j) in neighbours.iter().enumerate() {
                for &k in &neighbours[pos + 1..] {
                    let closing = strength(j, k);
                    if closing != 0.0 {
                        // (j, k) and (k, j) are both counted
                        triangles += 2.0 * strength(i, j) * strength(i, k) * closing;
                    }
                }
            }
            if triangles == 0.0 {
                return (i, 0.0);
            }

            let total_degree = preds.len() + succs.len();
            let reciprocal = preds.intersection(&succs).count();
            let possible = 2 * (total_degree * (total_degree - 1) - 2 * reciprocal);
            (i, triangles / possible as f64)
        })
        .collect();

    debug!(nodes = scores.len(), max_weight, "computed clustering coefficients");
    scores
}

/// Directed BFS from `start`: hop distance per node (`None` when
/// unreached), parent pointers, and the visit order.
fn bfs_parents(graph: &Graph, start: NodeId) -> (Vec<Option<u32>>, Vec<NodeId>, Vec<NodeId>) {
    let n = graph.node_count();
    let mut distance: Vec<Option<u32>> = vec![None; n];
    let mut parent: Vec<NodeId> = (0..n).collect();
    let mut order: Vec<NodeId> = Vec::new();
    let mut queue: VecDeque<NodeId> = VecDeque::new();

    distance[start] = Some(0);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        order.push(current);
        let depth = distance[current].unwrap_or(0);
        for edge in graph.out_edges(current) {
            if distance[edge.target].is_none() {
                distance[edge.target] = Some(depth + 1);
                parent[edge.target] = current;
                queue.push_back(edge.target);
            }
        }
    }

    (distance, parent, order)
}

/// The longest of all directed, unweighted shortest paths in the graph:
/// a witness for its diameter over reachable pairs.
///
/// Sources are scanned in node order and targets in BFS order; the first
/// path of maximal length wins. A graph without edges yields the single
/// node path `[0]`; an empty graph yields `None`.
pub fn longest_shortest_path(graph: &Graph) -> Option<Vec<NodeId>> {
    let mut best: Option<(u32, NodeId, NodeId)> = None;

    for source in graph.nodes() {
        let (distance, _, order) = bfs_parents(graph, source);
        for target in order {
            let hops = distance[target].unwrap_or(0);
            if best.map_or(true, |(best_hops, _, _)| hops > best_hops) {
                best = Some((hops, source, target));
            }
        }
    }

    let (_, source, target) = best?;
    let (_, parent, _) = bfs_parents(graph, source);
    let mut path = vec![target];
    let mut current = target;
    while current != source {
        current = parent[current];
        path.push(current);
    }
    path.reverse();
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeRecord;

    fn edge(from: &str, to: &str) -> EdgeRecord {
        EdgeRecord::new(from, to, 1.0)
    }

    #[test]
    fn test_k_core_triangle_with_tail() {
        // Triangle a-b-c (as a directed cycle) with tail c -> d
        let mut g = Graph::new();
        g.load_edges(vec![edge("a", "b"), edge("b", "c"), edge("c", "a"), edge("c", "d")]);
        let core = k_core(&g, 2).unwrap();
        assert_eq!(core.node_count(), 3);
        assert_eq!(core.edge_count(), 3);
        assert!(core.resolve("d").is_none());
    }

    #[test]
    fn test_k_core_cascade() {
        // Chain peels away completely
        let mut g = Graph::new();
        g.load_edges(vec![edge("a", "b"), edge("b", "c"), edge("c", "d")]);
        assert_eq!(k_core(&g, 2).unwrap().node_count(), 0);
        assert_eq!(k_core(&g, 1).unwrap().node_count(), 4);
        assert_eq!(k_core(&g, 0).unwrap().node_count(), 4);
    }

    #[test]
    fn test_k_core_reciprocal_edges_count_twice() {
        let mut g = Graph::new();
        g.load_edges(vec![edge("a", "b"), edge("b", "a")]);
        assert_eq!(k_core(&g, 2).unwrap().node_count(), 2);
        assert_eq!(k_core(&g, 3).unwrap().node_count(), 0);
    }

    #[test]
    fn test_k_core_ignores_self_loops() {
        let mut g = Graph::new();
        g.load_edges(vec![edge("a", "a"), edge("a", "b")]);
        assert_eq!(k_core(&g, 2).unwrap().node_count(), 0);
    }

    const EPS: f64 = 1e-12;

    #[test]
    fn test_clustering_feed_forward_triangle() {
        // a -> b, b -> c, a -> c: one of four possible directed triangles per node
        let mut g = Graph::new();
        g.load_edges(vec![edge("a", "b"), edge("b", "c"), edge("a", "c")]);
        let c = clustering_coefficient(&g);
        for id in g.nodes() {
            assert!((c[&id] - 0.5).abs() < EPS, "node {id}: {}", c[&id]);
        }
    }

    #[test]
    fn test_clustering_uses_geometric_mean_of_scaled_weights() {
        // Scaled weights 1/8, 1/8, 1: cube roots 0.5, 0.5, 1
        let mut g = Graph::new();
        g.load_edges(vec![
            EdgeRecord::new("a", "b", 1.0),
            EdgeRecord::new("b", "c", 1.0),
            EdgeRecord::new("a", "c", 8.0),
        ]);
        let c = clustering_coefficient(&g);
        for id in g.nodes() {
            assert!((c[&id] - 0.125).abs() < EPS, "node {id}: {}", c[&id]);
        }
    }

    #[test]
    fn test_clustering_fully_reciprocal_triangle() {
        let mut g = Graph::new();
        for (from, to) in [("a", "b"), ("b", "c"), ("c", "a")] {
            g.add_edge_by_label(from, to, 2.0);
            g.add_edge_by_label(to, from, 2.0);
        }
        let c = clustering_coefficient(&g);
        for id in g.nodes() {
            assert!((c[&id] - 1.0).abs() < EPS, "node {id}: {}", c[&id]);
        }
    }

    #[test]
    fn test_clustering_star_scores_zero() {
        let mut g = Graph::new();
        g.load_edges((0..5).map(|i| edge("hub", &format!("leaf{i}"))));
        let c = clustering_coefficient(&g);
        assert_eq!(c.len(), 6);
        assert!(c.values().all(|&score| score == 0.0));
    }

    #[test]
    fn test_clustering_without_edges() {
        let mut g = Graph::new();
        g.add_node("solo");
        g.add_edge_by_label("x", "x", 3.0);
        let c = clustering_coefficient(&g);
        assert_eq!(c[&0], 0.0);
        assert_eq!(c[&1], 0.0);
        assert!(clustering_coefficient(&Graph::new()).is_empty());
    }

    #[test]
    fn test_longest_path_chain() {
        let mut g = Graph::new();
        g.load_edges(vec![edge("a", "b"), edge("b", "c"), edge("c", "d")]);
        assert_eq!(longest_shortest_path(&g), Some(vec![0, 1, 2, 3]));
    }

    #[test]
    fn test_longest_path_uses_shortest_routes() {
        // a -> b -> c -> d plus shortcut a -> d: longest shortest path is 2 hops
        let mut g = Graph::new();
        g.load_edges(vec![edge("a", "b"), edge("b", "c"), edge("c", "d"), edge("a", "d")]);
        let path = longest_shortest_path(&g).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path, vec![0, 1, 2]);
    }

    #[test]
    fn test_longest_path_respects_direction() {
        // b <- a -> c: no 2-hop path exists
        let mut g = Graph::new();
        g.load_edges(vec![edge("a", "b"), edge("a", "c")]);
        assert_eq!(longest_shortest_path(&g).unwrap().len(), 2);
    }

    #[test]
    fn test_longest_path_degenerate() {
        assert_eq!(longest_shortest_path(&Graph::new()), None);
        let mut g = Graph::new();
        g.add_node("solo");
        assert_eq!(longest_shortest_path(&g), Some(vec![0]));
    }
}
