//! Closeness centrality over a dense all-pairs distance matrix.
//!
//! # Definition
//!
//! For node i with `count` reachable targets at total distance `total`
//! (Wasserman-Faust normalisation):
//!
//! ```text
//! C(i) = (count / total) * (count / (n - 1))
//! ```
//!
//! Nodes that reach nothing, or reach everything at zero cost, score 0.0.
//! The second factor penalises nodes that only reach a small part of the
//! graph, which keeps scores comparable on disconnected graphs.
//!
//! # Limitations
//!
//! Distances come from Floyd-Warshall on directed edge weights: O(n³) time,
//! O(n²) memory. Edge weights are expected to be non-negative. Negative
//! weights are accepted but negative cycles are only reported (via
//! `tracing::warn!`), not rejected, and the resulting scores are meaningless.
//! Scores lie in [0, 1] when every edge weight is at least 1; lighter edges
//! can push a score above 1 and are not clamped.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeId};

/// Dense row-major n×n matrix of directed path lengths.
///
/// Indexed by [`NodeId`], which is already a stable 0..n mapping of
/// `Graph::nodes()`. Unreachable pairs hold `f64::INFINITY`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Bytes needed for an n×n matrix.
    pub fn bytes_for(n: usize) -> usize {
        n.saturating_mul(n).saturating_mul(std::mem::size_of::<f64>())
    }

    /// Direct edge weights: weight where an edge exists, 0 on the
    /// diagonal, infinity elsewhere.
    pub fn from_graph(graph: &Graph) -> Self {
        let n = graph.node_count();
        let mut data = vec![f64::INFINITY; n * n];
        for i in 0..n {
            data[i * n + i] = 0.0;
        }
        for from in graph.nodes() {
            for edge in graph.out_edges(from) {
                if edge.target != from {
                    data[from * n + edge.target] = edge.weight;
                }
            }
        }
        Self { n, data }
    }

    /// All-pairs shortest directed path lengths (Floyd-Warshall).
    pub fn floyd_warshall(graph: &Graph) -> Self {
        let mut m = Self::from_graph(graph);
        let n = m.n;
        debug!(nodes = n, bytes = Self::bytes_for(n), "running floyd-warshall");

        for k in 0..n {
            for i in 0..n {
                let d_ik = m.data[i * n + k];
                if d_ik == f64::INFINITY {
                    continue;
                }
                for j in 0..n {
                    let via = d_ik + m.data[k * n + j];
                    if via < m.data[i * n + j] {
                        m.data[i * n + j] = via;
                    }
                }
            }
        }

        if m.has_negative_cycle() {
            warn!(
                nodes = n,
                "negative cycle in distance matrix; closeness scores are undefined"
            );
        }
        m
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Distance from `from` to `to`, None if either index is out of range.
    pub fn get(&self, from: NodeId, to: NodeId) -> Option<f64> {
        if from < self.n && to < self.n {
            self.data.get(from * self.n + to).copied()
        } else {
            None
        }
    }

    /// Distances from `from` to every node.
    pub fn row(&self, from: NodeId) -> Option<&[f64]> {
        if from < self.n {
            self.data.get(from * self.n..(from + 1) * self.n)
        } else {
            None
        }
    }

    /// A node that can reach itself at negative cost sits on a negative cycle.
    pub fn has_negative_cycle(&self) -> bool {
        (0..self.n).any(|i| self.data[i * self.n + i] < 0.0)
    }

    /// Closeness for every row, in node order.
    pub fn closeness(&self) -> Vec<f64> {
        let n = self.n;
        (0..n)
            .map(|i| {
                let mut total = CompensatedSum::default();
                let mut count = 0usize;
                for (j, &d) in self.data[i * n..(i + 1) * n].iter().enumerate() {
                    if j != i && d.is_finite() {
                        total.add(d);
                        count += 1;
                    }
                }
                let total = total.value();
                if total > 0.0 && n > 1 {
                    let count = count as f64;
                    (count / total) * (count / (n - 1) as f64)
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// Neumaier summation: keeps the low-order bits that plain `+=` drops when
/// adding many distances of very different magnitude.
#[derive(Debug, Default, Clone, Copy)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(self) -> f64 {
        self.sum + self.compensation
    }
}

/// Closeness centrality of every node from a fresh distance matrix.
pub fn closeness_centrality_matrix(graph: &Graph) -> HashMap<NodeId, f64> {
    let scores = DistanceMatrix::floyd_warshall(graph).closeness();
    graph.nodes().zip(scores).collect()
}

/// [`closeness_centrality_matrix`], refusing graphs whose distance matrix
/// would not fit in `config.max_matrix_memory_mb`.
pub fn closeness_centrality_with(
    graph: &Graph,
    config: &AnalysisConfig,
) -> Result<HashMap<NodeId, f64>> {
    let needed = DistanceMatrix::bytes_for(graph.node_count());
    if needed > config.max_matrix_bytes() {
        return Err(GraphError::invalid(format!(
            "distance matrix for {} nodes needs {} MB, limit is {} MB",
            graph.node_count(),
            needed / (1024 * 1024),
            config.max_matrix_memory_mb
        )));
    }
    Ok(closeness_centrality_matrix(graph))
}
