use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Dense node identifier, assigned in insertion order (0..n) and never
/// recomputed. Doubles as the canonical ordering used by enumeration and as
/// the row/column index of the distance matrix.
pub type NodeId = usize;

/// A weighted edge in an adjacency list.
///
/// In `outgoing[a]`, `target` is the head of the edge. In `incoming[b]`,
/// `target` is the tail (the node the edge comes from).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub target: NodeId,
    pub weight: f64,
}

/// One row of a bulk edge load, keyed by node label (e.g. a ticker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

impl EdgeRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }
}

/// In-memory directed weighted graph: adjacency lists + label interning.
///
/// Edges are stored bidirectionally — `outgoing[a]` contains edges from a,
/// `incoming[b]` contains edges into b. Both are populated on insert.
/// A second insert of the same ordered pair overwrites the weight in place.
///
/// Analyses borrow the graph immutably, so it cannot change underneath them;
/// the type is `Send + Sync` and can be shared across threads behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    labels: Vec<String>,
    label_index: HashMap<String, NodeId>,
    outgoing: Vec<Vec<Edge>>,
    incoming: Vec<Vec<Edge>>,
    /// (from, to) → (slot in outgoing[from], slot in incoming[to]).
    edge_slots: HashMap<(NodeId, NodeId), (usize, usize)>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for a known graph size.
    pub fn with_capacity(node_count: usize, edge_count: usize) -> Self {
        Self {
            labels: Vec::with_capacity(node_count),
            label_index: HashMap::with_capacity(node_count),
            outgoing: Vec::with_capacity(node_count),
            incoming: Vec::with_capacity(node_count),
            edge_slots: HashMap::with_capacity(edge_count),
        }
    }

    /// Register a node by label, returning its id. Re-adding a known label
    /// returns the existing id.
    pub fn add_node(&mut self, label: impl Into<String>) -> NodeId {
        let label = label.into();
        if let Some(&id) = self.label_index.get(&label) {
            return id;
        }
        let id = self.labels.len();
        self.label_index.insert(label.clone(), id);
        self.labels.push(label);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Add a directed edge between existing nodes. Last write wins for a
    /// repeated (from, to) pair.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, weight: f64) -> Result<()> {
        self.check_node(from)?;
        self.check_node(to)?;
        self.insert_edge(from, to, weight);
        Ok(())
    }

    /// Add an edge by label, creating either endpoint if it is new.
    pub fn add_edge_by_label(&mut self, from: &str, to: &str, weight: f64) -> (NodeId, NodeId) {
        let from_id = self.add_node(from);
        let to_id = self.add_node(to);
        self.insert_edge(from_id, to_id, weight);
        (from_id, to_id)
    }

    /// Both endpoints must already be registered.
    fn insert_edge(&mut self, from: NodeId, to: NodeId, weight: f64) {
        if let Some(&(out_slot, in_slot)) = self.edge_slots.get(&(from, to)) {
            self.outgoing[from][out_slot].weight = weight;
            self.incoming[to][in_slot].weight = weight;
            return;
        }

        let out_slot = self.outgoing[from].len();
        let in_slot = self.incoming[to].len();
        self.outgoing[from].push(Edge { target: to, weight });
        self.incoming[to].push(Edge {
            target: from,
            weight,
        });
        self.edge_slots.insert((from, to), (out_slot, in_slot));
    }

    /// Bulk load from edge records. This is the primary load path for
    /// externally parsed holdings data.
    pub fn load_edges<I>(&mut self, edges: I)
    where
        I: IntoIterator<Item = EdgeRecord>,
    {
        for record in edges {
            self.add_edge_by_label(&record.source, &record.target, record.weight);
        }
    }

    /// Look up a node by its label.
    pub fn resolve(&self, label: &str) -> Option<NodeId> {
        self.label_index.get(label).copied()
    }

    /// Label of a node.
    pub fn label(&self, id: NodeId) -> Result<&str> {
        self.labels
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| GraphError::NotFound(format!("node {id}")))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id < self.labels.len()
    }

    /// All node ids in canonical (insertion) order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeId> {
        0..self.labels.len()
    }

    /// Direct successors of `id`, in edge insertion order.
    pub fn successors(&self, id: NodeId) -> Result<impl Iterator<Item = NodeId> + '_> {
        self.check_node(id)?;
        Ok(self.outgoing[id].iter().map(|e| e.target))
    }

    /// Direct predecessors of `id`, in edge insertion order.
    pub fn predecessors(&self, id: NodeId) -> Result<impl Iterator<Item = NodeId> + '_> {
        self.check_node(id)?;
        Ok(self.incoming[id].iter().map(|e| e.target))
    }

    /// Get outgoing edges for a node. Empty for unknown ids.
    pub fn out_edges(&self, id: NodeId) -> &[Edge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get incoming edges for a node. Empty for unknown ids.
    pub fn in_edges(&self, id: NodeId) -> &[Edge] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Weight of the edge `from → to`.
    pub fn edge_weight(&self, from: NodeId, to: NodeId) -> Result<f64> {
        self.edge_slots
            .get(&(from, to))
            .map(|&(out_slot, _)| self.outgoing[from][out_slot].weight)
            .ok_or_else(|| GraphError::NotFound(format!("edge {from} -> {to}")))
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_slots.len()
    }

    /// Node-induced subgraph over `nodes`: the selected nodes plus every edge
    /// whose endpoints are both selected, with original labels and weights.
    ///
    /// Nodes receive fresh ids in the order given; duplicates are ignored.
    pub fn induced_subgraph(&self, nodes: &[NodeId]) -> Result<Graph> {
        let mut remap: HashMap<NodeId, NodeId> = HashMap::with_capacity(nodes.len());
        let mut sub = Graph::with_capacity(nodes.len(), nodes.len());

        for &id in nodes {
            let label = self.label(id)?;
            if !remap.contains_key(&id) {
                remap.insert(id, sub.add_node(label));
            }
        }

        // Only iterate outgoing edges so each edge is emitted once
        for &id in nodes {
            let from = remap[&id];
            for edge in self.out_edges(id) {
                if let Some(&to) = remap.get(&edge.target) {
                    sub.add_edge(from, to, edge.weight)?;
                }
            }
        }

        Ok(sub)
    }

    /// Approximate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        use std::mem::size_of;

        let labels_mem: usize = self.labels.iter().map(|l| l.len() + size_of::<String>()).sum();
        let index_mem = self.label_index.len() * (size_of::<String>() + size_of::<NodeId>() + 16);
        let edges_mem = 2 * self.edge_slots.len() * size_of::<Edge>();
        let slots_mem = self.edge_slots.len() * (4 * size_of::<usize>() + 8);

        labels_mem + index_mem + edges_mem + slots_mem
    }

    fn check_node(&self, id: NodeId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(GraphError::NotFound(format!("node {id}")))
        }
    }
}
