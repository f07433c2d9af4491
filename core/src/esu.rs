//! Exact enumeration of connected induced subgraphs (Wernicke's ESU).
//!
//! Every connected set of exactly `k` nodes is emitted once. Adjacency is
//! direction-agnostic. Each subgraph is found only from its smallest node
//! (the root): candidates enter the extension set only if their id is
//! greater than the root's, and a candidate reached through the partial
//! subgraph's existing neighbourhood is never re-added. The recursion of the
//! textbook algorithm is run as an explicit stack of frames whose depth is
//! bounded by `k`, with deadline and cancellation checks between frames.

use std::collections::{BTreeSet, HashSet};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeId};
use crate::neighborhood::neighbors_undirected;

/// Frames processed between deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 64;

/// Limits for a single enumeration run.
#[derive(Debug, Clone, Default)]
pub struct EsuOptions {
    /// Abort with `DeadlineExceeded` once this instant has passed.
    pub deadline: Option<Instant>,
    /// Abort with `Cancelled` once this flag is set.
    pub cancel: Option<Arc<AtomicBool>>,
    /// Stop quietly after this many subgraphs.
    pub max_results: Option<usize>,
}

impl EsuOptions {
    /// Options with the deadline taken from `config`, starting now.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            deadline: config.esu_deadline.map(|budget| Instant::now() + budget),
            ..Self::default()
        }
    }

    fn check(&self, steps: u64, emitted: usize) -> Result<()> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(GraphError::Cancelled { emitted });
            }
        }
        if let Some(deadline) = self.deadline {
            if steps % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                return Err(GraphError::DeadlineExceeded { emitted });
            }
        }
        Ok(())
    }
}

/// One pending extension step.
struct Frame {
    /// Nodes selected so far (Vsub). The first entry is the root.
    sub: Vec<NodeId>,
    /// Nodes that may still extend `sub` (Vext); all greater than the root.
    ext: BTreeSet<NodeId>,
    /// `sub` together with every neighbour of `sub`.
    closed: HashSet<NodeId>,
}

impl Frame {
    fn root(graph: &Graph, root: NodeId) -> Result<Self> {
        let neighbors = neighbors_undirected(graph, root)?;
        let ext = neighbors.iter().copied().filter(|&u| u > root).collect();
        let mut closed: HashSet<NodeId> = neighbors.into_iter().collect();
        closed.insert(root);
        Ok(Self {
            sub: vec![root],
            ext,
            closed,
        })
    }

    /// Child frame for `sub ∪ {w}`. `self.ext` must no longer contain `w`.
    fn extend(&self, graph: &Graph, w: NodeId) -> Result<Self> {
        let root = self.sub[0];
        let w_neighbors = neighbors_undirected(graph, w)?;

        // Exclusive neighbourhood of w, restricted to ids above the root
        let mut ext = self.ext.clone();
        ext.extend(
            w_neighbors
                .iter()
                .copied()
                .filter(|&u| u > root && !self.closed.contains(&u)),
        );

        let mut closed = self.closed.clone();
        closed.extend(w_neighbors);

        let mut sub = Vec::with_capacity(self.sub.len() + 1);
        sub.extend_from_slice(&self.sub);
        sub.push(w);

        Ok(Self { sub, ext, closed })
    }
}

fn check_k(graph: &Graph, k: usize) -> Result<()> {
    if k == 0 || k > graph.node_count() {
        return Err(GraphError::invalid(format!(
            "subgraph size k must be within 1..={}, got {k}",
            graph.node_count()
        )));
    }
    Ok(())
}

/// Stream every connected induced subgraph of `k` nodes to `visit`.
///
/// Each set is passed sorted ascending. Returning `ControlFlow::Break` from
/// `visit` stops the run early. Returns the number of subgraphs visited.
pub fn for_each_subgraph<F>(
    graph: &Graph,
    k: usize,
    options: &EsuOptions,
    mut visit: F,
) -> Result<usize>
where
    F: FnMut(&[NodeId]) -> ControlFlow<()>,
{
    check_k(graph, k)?;

    let mut emitted = 0usize;
    let mut steps = 0u64;
    let mut scratch: Vec<NodeId> = Vec::with_capacity(k);
    let mut stack: Vec<Frame> = Vec::with_capacity(k);

    for root in graph.nodes() {
        stack.push(Frame::root(graph, root)?);

        while let Some(frame) = stack.last_mut() {
            options.check(steps, emitted)?;
            steps += 1;

            if frame.sub.len() == k {
                scratch.clear();
                scratch.extend_from_slice(&frame.sub);
                scratch.sort_unstable();
                debug_assert!(
                    crate::components::is_connected_induced(graph, &scratch),
                    "emitted disconnected subgraph {scratch:?}"
                );
                emitted += 1;

                let stop = visit(&scratch).is_break()
                    || options.max_results.is_some_and(|max| emitted >= max);
                if stop {
                    debug!(k, emitted, steps, "subgraph enumeration stopped early");
                    return Ok(emitted);
                }
                stack.pop();
                continue;
            }

            let Some(w) = frame.ext.pop_first() else {
                stack.pop();
                continue;
            };
            let child = frame.extend(graph, w)?;
            stack.push(child);
        }
    }

    debug!(k, emitted, steps, "subgraph enumeration finished");
    Ok(emitted)
}

/// Every connected induced subgraph of exactly `k` nodes, each as a sorted
/// list of node ids. No set appears twice.
///
/// Runtime is exponential in `k` and node degree; bound `k` accordingly or
/// use [`enumerate_subgraphs_with`] with a deadline.
pub fn enumerate_subgraphs(graph: &Graph, k: usize) -> Result<Vec<Vec<NodeId>>> {
    enumerate_subgraphs_with(graph, k, &EsuOptions::default())
}

pub fn enumerate_subgraphs_with(
    graph: &Graph,
    k: usize,
    options: &EsuOptions,
) -> Result<Vec<Vec<NodeId>>> {
    let mut out = Vec::new();
    for_each_subgraph(graph, k, options, |nodes| {
        out.push(nodes.to_vec());
        ControlFlow::Continue(())
    })?;
    Ok(out)
}

/// Number of connected induced subgraphs of `k` nodes.
pub fn count_subgraphs(graph: &Graph, k: usize) -> Result<usize> {
    for_each_subgraph(graph, k, &EsuOptions::default(), |_| ControlFlow::Continue(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::is_connected_induced;
    use crate::graph::EdgeRecord;
    use std::time::Duration;

    fn edge(from: &str, to: &str, w: f64) -> EdgeRecord {
        EdgeRecord::new(from, to, w)
    }

    fn triangle() -> Graph {
        let mut g = Graph::new();
        g.load_edges(vec![edge("A", "B", 1.0), edge("B", "C", 1.0), edge("A", "C", 5.0)]);
        g
    }

    fn make_chain(n: usize) -> Graph {
        let mut g = Graph::new();
        g.load_edges((0..n - 1).map(|i| edge(&format!("n{i}"), &format!("n{}", i + 1), 1.0)));
        g
    }

    fn make_star(leaves: usize) -> Graph {
        let mut g = Graph::new();
        g.load_edges((1..=leaves).map(|i| edge("S", &format!("L{i}"), 1.0)));
        g
    }

    fn labelled(g: &Graph, sets: &[Vec<NodeId>]) -> BTreeSet<Vec<String>> {
        sets.iter()
            .map(|s| {
                let mut names: Vec<String> =
                    s.iter().map(|&id| g.label(id).unwrap().to_string()).collect();
                names.sort();
                names
            })
            .collect()
    }

    /// Every k-combination of nodes, filtered to connected ones.
    fn brute_force_count(g: &Graph, k: usize) -> usize {
        fn go(g: &Graph, k: usize, start: usize, current: &mut Vec<NodeId>, count: &mut usize) {
            if current.len() == k {
                if is_connected_induced(g, current) {
                    *count += 1;
                }
                return;
            }
            for id in start..g.node_count() {
                current.push(id);
                go(g, k, id + 1, current, count);
                current.pop();
            }
        }
        let mut count = 0;
        go(g, k, 0, &mut Vec::new(), &mut count);
        count
    }

    #[test]
    fn test_triangle_pairs() {
        let g = triangle();
        let subs = enumerate_subgraphs(&g, 2).unwrap();
        let expected: BTreeSet<Vec<String>> = [["A", "B"], ["B", "C"], ["A", "C"]]
            .iter()
            .map(|p| p.iter().map(|s| s.to_string()).collect())
            .collect();
        assert_eq!(subs.len(), 3);
        assert_eq!(labelled(&g, &subs), expected);
    }

    #[test]
    fn test_triangle_whole() {
        let g = triangle();
        let subs = enumerate_subgraphs(&g, 3).unwrap();
        assert_eq!(subs, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_k_one_lists_every_node() {
        let g = make_chain(4);
        let subs = enumerate_subgraphs(&g, 1).unwrap();
        assert_eq!(subs, vec![vec![0], vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_chain_counts() {
        // A path of n nodes has n - k + 1 connected k-subsets
        let g = make_chain(8);
        for k in 1..=8 {
            assert_eq!(count_subgraphs(&g, k).unwrap(), 8 - k + 1, "k={k}");
        }
    }

    #[test]
    fn test_star_counts() {
        // Star with 5 leaves: connected 3-sets are centre + 2 leaves
        let g = make_star(5);
        assert_eq!(count_subgraphs(&g, 3).unwrap(), 10);
        assert_eq!(count_subgraphs(&g, 2).unwrap(), 5);
    }

    #[test]
    fn test_clique_counts() {
        // K5: every subset is connected, C(5,3) = 10
        let mut g = Graph::new();
        for i in 0..5 {
            for j in (i + 1)..5 {
                g.add_edge_by_label(&format!("v{i}"), &format!("v{j}"), 1.0);
            }
        }
        assert_eq!(count_subgraphs(&g, 3).unwrap(), 10);
        assert_eq!(count_subgraphs(&g, 4).unwrap(), 5);
    }

    #[test]
    fn test_matches_brute_force_on_mixed_graph() {
        // Two triangles joined by a bridge, plus a pendant and an isolated node
        let mut g = Graph::new();
        g.load_edges(vec![
            edge("a", "b", 1.0),
            edge("b", "c", 1.0),
            edge("c", "a", 1.0),
            edge("c", "d", 1.0),
            edge("d", "e", 1.0),
            edge("e", "f", 1.0),
            edge("f", "d", 1.0),
            edge("g", "f", 1.0),
        ]);
        g.add_node("iso");
        for k in 1..=g.node_count() {
            let subs = enumerate_subgraphs(&g, k).unwrap();
            assert_eq!(subs.len(), brute_force_count(&g, k), "k={k}");
            let unique: BTreeSet<&Vec<NodeId>> = subs.iter().collect();
            assert_eq!(unique.len(), subs.len(), "duplicates at k={k}");
            for s in &subs {
                assert_eq!(s.len(), k);
                assert!(is_connected_induced(&g, s));
            }
        }
    }

    #[test]
    fn test_direction_ignored() {
        // a <- b -> c: connected once direction is dropped
        let mut g = Graph::new();
        g.load_edges(vec![edge("b", "a", 1.0), edge("b", "c", 1.0)]);
        assert_eq!(count_subgraphs(&g, 3).unwrap(), 1);
    }

    #[test]
    fn test_reciprocal_and_self_loop_edges() {
        let mut g = Graph::new();
        g.load_edges(vec![
            edge("a", "b", 1.0),
            edge("b", "a", 1.0),
            edge("b", "b", 1.0),
            edge("b", "c", 1.0),
        ]);
        assert_eq!(count_subgraphs(&g, 2).unwrap(), 2);
        assert_eq!(count_subgraphs(&g, 3).unwrap(), 1);
    }

    #[test]
    fn test_idempotent() {
        let g = make_star(6);
        let a: BTreeSet<Vec<NodeId>> = enumerate_subgraphs(&g, 3).unwrap().into_iter().collect();
        let b: BTreeSet<Vec<NodeId>> = enumerate_subgraphs(&g, 3).unwrap().into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_k() {
        let g = triangle();
        assert!(matches!(
            enumerate_subgraphs(&g, 0),
            Err(GraphError::InvalidArgument(_))
        ));
        assert!(matches!(
            enumerate_subgraphs(&g, 4),
            Err(GraphError::InvalidArgument(_))
        ));
        assert!(enumerate_subgraphs(&Graph::new(), 1).is_err());
    }

    #[test]
    fn test_visitor_break() {
        let g = make_chain(10);
        let mut seen = 0;
        let visited = for_each_subgraph(&g, 2, &EsuOptions::default(), |_| {
            seen += 1;
            if seen == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_max_results() {
        let g = make_star(8);
        let opts = EsuOptions {
            max_results: Some(4),
            ..EsuOptions::default()
        };
        assert_eq!(enumerate_subgraphs_with(&g, 3, &opts).unwrap().len(), 4);
    }

    #[test]
    fn test_deadline_exceeded() {
        let g = make_star(8);
        let opts = EsuOptions {
            deadline: Some(Instant::now()),
            ..EsuOptions::default()
        };
        assert!(matches!(
            enumerate_subgraphs_with(&g, 3, &opts),
            Err(GraphError::DeadlineExceeded { .. })
        ));
    }

    #[test]
    fn test_cancelled() {
        let g = make_star(8);
        let flag = Arc::new(AtomicBool::new(true));
        let opts = EsuOptions {
            cancel: Some(Arc::clone(&flag)),
            ..EsuOptions::default()
        };
        assert_eq!(
            enumerate_subgraphs_with(&g, 3, &opts).unwrap_err(),
            GraphError::Cancelled { emitted: 0 }
        );
    }

    #[test]
    fn test_options_from_config() {
        let cfg = AnalysisConfig {
            esu_deadline: Some(Duration::from_secs(60)),
            ..AnalysisConfig::default()
        };
        let opts = EsuOptions::from_config(&cfg);
        assert!(opts.deadline.is_some());
        assert_eq!(count_subgraphs(&make_chain(5), 2).unwrap(), 4);
        assert_eq!(
            enumerate_subgraphs_with(&make_chain(5), 2, &opts).unwrap().len(),
            4
        );
    }
}
