//! Random connected-subgraph sampling by frontier expansion.
//!
//! Pick a weakly-connected component larger than the sample, pick a start
//! node in it, then repeatedly move a uniformly chosen frontier node into
//! the selection and grow the frontier with its neighbours. The result is
//! the induced subgraph over the selection.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::components::weakly_connected_components;
use crate::config::AnalysisConfig;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeId};
use crate::neighborhood::neighbors_undirected;

/// A sampled connected region.
#[derive(Debug, Clone)]
pub struct ConnectedSample {
    /// Selected node ids in the source graph, in selection order.
    pub nodes: Vec<NodeId>,
    /// Induced subgraph over `nodes`. Its ids follow the same order.
    pub subgraph: Graph,
    /// Size that was asked for.
    pub requested: usize,
}

impl ConnectedSample {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when the frontier ran dry before reaching the requested size.
    /// Not an error; callers that need exactly `requested` nodes check this.
    pub fn is_underfilled(&self) -> bool {
        self.nodes.len() < self.requested
    }
}

/// Frontier set with O(1) insert, remove and uniform pick.
///
/// Backed by a vector plus a position index; iteration order depends only
/// on insertion order, so a seeded rng reproduces the same picks.
#[derive(Debug, Default)]
struct CandidatePool {
    items: Vec<NodeId>,
    position: HashMap<NodeId, usize>,
}

impl CandidatePool {
    fn insert(&mut self, id: NodeId) {
        if !self.position.contains_key(&id) {
            self.position.insert(id, self.items.len());
            self.items.push(id);
        }
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn take_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<NodeId> {
        if self.items.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.items.len());
        let picked = self.items.swap_remove(idx);
        self.position.remove(&picked);
        if let Some(&moved) = self.items.get(idx) {
            self.position.insert(moved, idx);
        }
        Some(picked)
    }
}

/// Sample a connected induced subgraph of `n` nodes.
///
/// Only components with more than `n` nodes are eligible. Fails with
/// `InvalidArgument` when `n` is 0 or not smaller than the graph, and with
/// `InsufficientComponentSize` when no component qualifies.
pub fn sample_connected<R: Rng + ?Sized>(
    graph: &Graph,
    n: usize,
    rng: &mut R,
) -> Result<ConnectedSample> {
    if n == 0 {
        return Err(GraphError::invalid("sample size must be positive"));
    }
    if n >= graph.node_count() {
        return Err(GraphError::invalid(format!(
            "sample size {n} must be smaller than the graph ({} nodes)",
            graph.node_count()
        )));
    }

    let components = weakly_connected_components(graph);
    let largest = components.iter().map(Vec::len).max().unwrap_or(0);
    let eligible: Vec<&Vec<NodeId>> = components.iter().filter(|c| c.len() > n).collect();
    debug!(
        requested = n,
        eligible = eligible.len(),
        "components with more than the requested nodes"
    );

    let component = eligible
        .choose(rng)
        .ok_or(GraphError::InsufficientComponentSize {
            requested: n,
            largest,
        })?;
    let start = *component
        .choose(rng)
        .ok_or(GraphError::InsufficientComponentSize {
            requested: n,
            largest,
        })?;

    let mut selected: Vec<NodeId> = Vec::with_capacity(n);
    let mut in_selection: HashSet<NodeId> = HashSet::with_capacity(n);
    selected.push(start);
    in_selection.insert(start);

    let mut candidates = CandidatePool::default();
    for neighbor in neighbors_undirected(graph, start)? {
        candidates.insert(neighbor);
    }

    while selected.len() < n && !candidates.is_empty() {
        let Some(picked) = candidates.take_random(rng) else {
            break;
        };
        selected.push(picked);
        in_selection.insert(picked);

        for neighbor in neighbors_undirected(graph, picked)? {
            if !in_selection.contains(&neighbor) {
                candidates.insert(neighbor);
            }
        }
    }

    if selected.len() < n {
        debug!(
            requested = n,
            selected = selected.len(),
            "frontier exhausted before reaching sample size"
        );
    }

    let subgraph = graph.induced_subgraph(&selected)?;
    Ok(ConnectedSample {
        nodes: selected,
        subgraph,
        requested: n,
    })
}

/// [`sample_connected`] with a reproducible seeded generator.
pub fn sample_connected_seeded(graph: &Graph, n: usize, seed: u64) -> Result<ConnectedSample> {
    let mut rng = StdRng::seed_from_u64(seed);
    sample_connected(graph, n, &mut rng)
}

/// [`sample_connected`] using the seed from `config`, or thread-local
/// entropy when none is set.
pub fn sample_connected_with(
    graph: &Graph,
    n: usize,
    config: &AnalysisConfig,
) -> Result<ConnectedSample> {
    match config.sample_seed {
        Some(seed) => sample_connected_seeded(graph, n, seed),
        None => sample_connected(graph, n, &mut rand::thread_rng()),
    }
}
