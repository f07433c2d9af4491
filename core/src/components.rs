//! Weakly connected components and induced connectivity.
//!
//! Both treat edges as undirected. Components are found with union-find
//! over the edge list, O(V + E * alpha(V)).

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::graph::{Graph, NodeId};
use crate::neighborhood::iter_undirected;

fn uf_find(parent: &mut [usize], mut i: usize) -> usize {
    let mut root = i;
    while parent[root] != root {
        root = parent[root];
    }
    // Path compression
    while parent[i] != root {
        let next = parent[i];
        parent[i] = root;
        i = next;
    }
    root
}

fn uf_union(parent: &mut [usize], rank: &mut [u8], x: usize, y: usize) {
    let px = uf_find(parent, x);
    let py = uf_find(parent, y);
    if px == py {
        return;
    }
    match rank[px].cmp(&rank[py]) {
        std::cmp::Ordering::Less => parent[px] = py,
        std::cmp::Ordering::Greater => parent[py] = px,
        std::cmp::Ordering::Equal => {
            parent[py] = px;
            rank[px] = rank[px].saturating_add(1);
        }
    }
}

/// Compute weakly connected components.
///
/// Each component is sorted ascending, and components are ordered by their
/// smallest node id, so the output is stable for a given graph.
pub fn weakly_connected_components(graph: &Graph) -> Vec<Vec<NodeId>> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let mut parent: Vec<usize> = (0..n).collect();
    let mut rank: Vec<u8> = vec![0; n];

    for from in graph.nodes() {
        for edge in graph.out_edges(from) {
            uf_union(&mut parent, &mut rank, from, edge.target);
        }
    }

    // Nodes are visited in ascending order, so the first member seen fixes
    // the component's position and members land already sorted.
    let mut slot_of_root: Vec<Option<usize>> = vec![None; n];
    let mut components: Vec<Vec<NodeId>> = Vec::new();
    for node in graph.nodes() {
        let root = uf_find(&mut parent, node);
        match slot_of_root[root] {
            Some(slot) => components[slot].push(node),
            None => {
                slot_of_root[root] = Some(components.len());
                components.push(vec![node]);
            }
        }
    }

    debug!(
        nodes = n,
        components = components.len(),
        "computed weakly connected components"
    );
    components
}

/// Whether `nodes` induce a single connected component (ignoring direction).
///
/// An empty selection is not connected. Unknown ids make the selection
/// disconnected since nothing can reach them.
pub fn is_connected_induced(graph: &Graph, nodes: &[NodeId]) -> bool {
    let Some(&first) = nodes.first() else {
        return false;
    };
    let members: HashSet<NodeId> = nodes.iter().copied().collect();
    if members.iter().any(|&id| !graph.contains(id)) {
        return false;
    }

    let mut seen: HashSet<NodeId> = HashSet::with_capacity(members.len());
    let mut queue: VecDeque<NodeId> = VecDeque::new();
    seen.insert(first);
    queue.push_back(first);

    while let Some(current) = queue.pop_front() {
        for next in iter_undirected(graph, current) {
            if members.contains(&next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }

    seen.len() == members.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeRecord;

    fn edge(from: &str, to: &str) -> EdgeRecord {
        EdgeRecord::new(from, to, 1.0)
    }

    #[test]
    fn test_wcc_ignores_direction() {
        // A -> B <- C, D -> E, F isolated
        let mut g = Graph::new();
        g.load_edges(vec![edge("A", "B"), edge("C", "B"), edge("D", "E")]);
        g.add_node("F");
        let wcc = weakly_connected_components(&g);
        assert_eq!(wcc, vec![vec![0, 1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_wcc_empty() {
        assert!(weakly_connected_components(&Graph::new()).is_empty());
    }

    #[test]
    fn test_wcc_late_bridge() {
        // Components merge only through the last edge
        let mut g = Graph::new();
        g.load_edges(vec![edge("A", "B"), edge("C", "D"), edge("D", "A")]);
        let wcc = weakly_connected_components(&g);
        assert_eq!(wcc.len(), 1);
        assert_eq!(wcc[0], vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_connected_induced() {
        // Chain A - B - C
        let mut g = Graph::new();
        g.load_edges(vec![edge("A", "B"), edge("C", "B")]);
        assert!(is_connected_induced(&g, &[0, 1, 2]));
        assert!(is_connected_induced(&g, &[2, 1]));
        // A and C only meet through B
        assert!(!is_connected_induced(&g, &[0, 2]));
        assert!(is_connected_induced(&g, &[1]));
        assert!(!is_connected_induced(&g, &[]));
        assert!(!is_connected_induced(&g, &[0, 17]));
    }
}
