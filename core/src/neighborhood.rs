use std::collections::BTreeSet;

use crate::error::Result;
use crate::graph::{Graph, NodeId};

/// Undirected neighbourhood of `node`: successors ∪ predecessors, deduplicated.
///
/// Edge direction is ignored. `node` itself is never included, even when it
/// carries a self-loop. The set is ordered so that anything iterating it
/// (sampling, enumeration) behaves the same run to run.
pub fn neighbors_undirected(graph: &Graph, node: NodeId) -> Result<BTreeSet<NodeId>> {
    let out = graph.successors(node)?;
    let inc = graph.predecessors(node)?;
    Ok(out.chain(inc).filter(|&n| n != node).collect())
}

/// Iterate undirected neighbours without allocating. May yield duplicates
/// (a node that is both successor and predecessor) and `node` itself on a
/// self-loop; callers filter as needed. Unknown ids yield nothing.
pub(crate) fn iter_undirected(graph: &Graph, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    graph
        .out_edges(node)
        .iter()
        .chain(graph.in_edges(node).iter())
        .map(|e| e.target)
}
