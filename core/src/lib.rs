//! holdings-graph-core: structural analysis of ownership graphs.
//!
//! A pure Rust library over an in-memory directed, edge-weighted graph
//! (fund → holding, weighted by market value). It provides exact
//! enumeration of connected k-node subgraphs (ESU), random connected
//! sampling, Floyd-Warshall closeness centrality, and supporting
//! rankings. Parsing input files is left to the caller: build a
//! [`Graph`] in memory and hand out `&Graph` to the analyses, which never
//! mutate it and may run concurrently.

mod centrality;
mod closeness;
mod components;
mod config;
mod error;
mod esu;
mod graph;
mod neighborhood;
mod sampling;
mod structure;

pub use centrality::{
    approximate_betweenness, capitalization, degree_centrality, max_in_degree_node,
    max_out_degree_node, min_in_degree_node, top_k, DegreeResult,
};
pub use closeness::{closeness_centrality_matrix, closeness_centrality_with, DistanceMatrix};
pub use components::{is_connected_induced, weakly_connected_components};
pub use config::{
    AnalysisConfig, DEFAULT_BETWEENNESS_PERCENTAGE, DEFAULT_MAX_MATRIX_MEMORY_MB,
    MAX_MAX_MATRIX_MEMORY_MB, MIN_MAX_MATRIX_MEMORY_MB,
};
pub use error::{GraphError, Result};
pub use esu::{
    count_subgraphs, enumerate_subgraphs, enumerate_subgraphs_with, for_each_subgraph, EsuOptions,
};
pub use graph::{Edge, EdgeRecord, Graph, NodeId};
pub use neighborhood::neighbors_undirected;
pub use sampling::{sample_connected, sample_connected_seeded, sample_connected_with, ConnectedSample};
pub use structure::{clustering_coefficient, k_core, longest_shortest_path};
