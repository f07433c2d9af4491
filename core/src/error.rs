//! Error types for graph analysis.

use thiserror::Error;

/// Structural and input errors raised by the analyses.
///
/// None of these are transient: they are reported at the point of detection
/// and never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A parameter is outside its valid range (k, n, percentage, config bounds).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No weakly-connected component is large enough to sample from.
    #[error("no connected component with more than {requested} nodes (largest has {largest})")]
    InsufficientComponentSize { requested: usize, largest: usize },

    /// Query against a node or edge that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Enumeration ran past its deadline.
    #[error("deadline exceeded after {emitted} subgraphs")]
    DeadlineExceeded { emitted: usize },

    /// Enumeration was cancelled through its cancellation flag.
    #[error("cancelled after {emitted} subgraphs")]
    Cancelled { emitted: usize },
}

impl GraphError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type for graph analysis operations.
pub type Result<T> = std::result::Result<T, GraphError>;
