use thiserror::Error;

/// Result alias for `speakeasy2`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the clustering engine.
///
/// All of these are precondition failures: they are reported before any
/// independent run starts, and no partial result is produced.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Two sequences that must line up have different lengths.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// The merge and burst operators require an undirected graph.
    #[error("graph must be undirected")]
    DirectedGraph,

    /// An edge or label referenced a node id outside the graph.
    #[error("node id {id} out of range for {n_nodes} nodes")]
    NodeOutOfRange {
        /// Offending id.
        id: usize,
        /// Number of nodes in the graph.
        n_nodes: usize,
    },

    /// The worker pool could not be built.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
