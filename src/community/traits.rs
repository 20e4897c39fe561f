//! Community detection traits.

use crate::error::Result;
use petgraph::graph::UnGraph;

/// Trait for community detection algorithms.
pub trait CommunityDetection {
    /// Detect communities in a graph, every edge weighing 1.
    ///
    /// Returns a mapping from node index to community ID.
    fn detect<N, E>(&self, graph: &UnGraph<N, E>) -> Result<Vec<usize>>;

    /// Detect communities in a graph whose edge payloads are weights.
    fn detect_weighted<N>(&self, graph: &UnGraph<N, f64>) -> Result<Vec<usize>>;
}
