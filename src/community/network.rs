//! Read-only weighted graph view used by the clustering engine.
//!
//! The engine only ever asks three questions of a graph: who sends weight
//! to a node (in-neighbors), how much weight a node sends and receives
//! (strength), and whether edges are directed. [`Network`] answers those
//! from flat adjacency lists built once, up front, so independent runs can
//! share it by reference.

use crate::error::{Error, Result};
use petgraph::graph::{Graph, IndexType};
use petgraph::visit::EdgeRef;
use petgraph::EdgeType;

/// Weighted adjacency keyed by target node.
#[derive(Debug, Clone)]
pub struct Network {
    n: usize,
    n_edges: usize,
    directed: bool,
    /// In-adjacency: node -> [(source, weight)]
    in_adj: Vec<Vec<(usize, f64)>>,
    in_strength: Vec<f64>,
    out_strength: Vec<f64>,
}

impl Network {
    /// Build from an edge list `(source, target, weight)`.
    ///
    /// Undirected edges are stored in both directions (self-loops once).
    pub fn from_edges(n: usize, edges: &[(usize, usize, f64)], directed: bool) -> Result<Self> {
        let mut net = Self::empty(n, directed);
        for &(i, j, w) in edges {
            for id in [i, j] {
                if id >= n {
                    return Err(Error::NodeOutOfRange { id, n_nodes: n });
                }
            }
            if !w.is_finite() {
                return Err(Error::InvalidParameter {
                    name: "weights",
                    message: "edge weights must be finite",
                });
            }
            net.add_edge(i, j, w);
        }
        Ok(net)
    }

    /// Build from a petgraph graph, with optional per-edge weights.
    ///
    /// `weights[e]` is the weight of the edge with index `e`; when absent
    /// every edge weighs 1.
    pub fn from_graph<N, E, Ty, Ix>(
        graph: &Graph<N, E, Ty, Ix>,
        weights: Option<&[f64]>,
    ) -> Result<Self>
    where
        Ty: EdgeType,
        Ix: IndexType,
    {
        if let Some(w) = weights {
            if w.len() != graph.edge_count() {
                return Err(Error::DimensionMismatch {
                    expected: graph.edge_count(),
                    found: w.len(),
                });
            }
        }

        let edges: Vec<(usize, usize, f64)> = graph
            .edge_references()
            .map(|e| {
                let w = weights.map_or(1.0, |w| w[e.id().index()]);
                (e.source().index(), e.target().index(), w)
            })
            .collect();

        Self::from_edges(graph.node_count(), &edges, graph.is_directed())
    }

    /// Build from a petgraph graph whose edge payload is the weight.
    pub fn from_weighted_graph<N, Ty, Ix>(graph: &Graph<N, f64, Ty, Ix>) -> Result<Self>
    where
        Ty: EdgeType,
        Ix: IndexType,
    {
        let weights: Vec<f64> = graph.edge_references().map(|e| *e.weight()).collect();
        Self::from_graph(graph, Some(&weights))
    }

    fn empty(n: usize, directed: bool) -> Self {
        Self {
            n,
            n_edges: 0,
            directed,
            in_adj: vec![Vec::new(); n],
            in_strength: vec![0.0; n],
            out_strength: vec![0.0; n],
        }
    }

    fn add_edge(&mut self, from: usize, to: usize, w: f64) {
        self.n_edges += 1;
        self.in_adj[to].push((from, w));
        self.in_strength[to] += w;
        self.out_strength[from] += w;

        if !self.directed && from != to {
            self.in_adj[from].push((to, w));
            self.in_strength[from] += w;
            self.out_strength[to] += w;
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.n
    }

    /// Number of edges as given (undirected edges counted once).
    pub fn edge_count(&self) -> usize {
        self.n_edges
    }

    /// Whether edges are directed.
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Sources of edges pointing at `node`, with their weights.
    pub fn in_neighbors(&self, node: usize) -> &[(usize, f64)] {
        &self.in_adj[node]
    }

    /// Total weight received by each node.
    pub fn in_strength(&self) -> &[f64] {
        &self.in_strength
    }

    /// Total weight emitted by each node.
    pub fn out_strength(&self) -> &[f64] {
        &self.out_strength
    }

    /// Sum of all edge weights, as seen from the receiving side.
    pub fn total_weight(&self) -> f64 {
        self.in_strength.iter().sum()
    }

    /// Subnetwork induced by `nodes`; node `nodes[k]` becomes node `k`.
    pub fn induced(&self, nodes: &[usize]) -> Self {
        let mut position = vec![usize::MAX; self.n];
        for (k, &v) in nodes.iter().enumerate() {
            position[v] = k;
        }

        let mut sub = Self::empty(nodes.len(), self.directed);
        for (k, &v) in nodes.iter().enumerate() {
            for &(u, w) in &self.in_adj[v] {
                let src = position[u];
                if src == usize::MAX {
                    continue;
                }
                // Undirected edges already appear in both lists.
                sub.in_adj[k].push((src, w));
                sub.in_strength[k] += w;
                sub.out_strength[src] += w;
                if self.directed || src <= k {
                    sub.n_edges += 1;
                }
            }
        }
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::{DiGraph, UnGraph};

    #[test]
    fn test_undirected_strength() {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let c = graph.add_node(());
        let _ = graph.add_edge(a, b, ());
        let _ = graph.add_edge(b, c, ());

        let net = Network::from_graph(&graph, Some(&[2.0, 0.5])).unwrap();
        assert!(!net.is_directed());
        assert_eq!(net.edge_count(), 2);
        assert_eq!(net.in_strength(), &[2.0, 2.5, 0.5]);
        assert_eq!(net.in_strength(), net.out_strength());
        assert_eq!(net.in_neighbors(1).len(), 2);
        assert!((net.total_weight() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_directed_in_neighbors() {
        let mut graph = DiGraph::<(), f64>::new();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let _ = graph.add_edge(a, b, 3.0);

        let net = Network::from_weighted_graph(&graph).unwrap();
        assert!(net.is_directed());
        assert_eq!(net.in_neighbors(1), &[(0, 3.0)]);
        assert!(net.in_neighbors(0).is_empty());
        assert_eq!(net.out_strength(), &[3.0, 0.0]);
        assert_eq!(net.in_strength(), &[0.0, 3.0]);
    }

    #[test]
    fn test_weight_length_mismatch() {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let _ = graph.add_edge(a, b, ());

        let err = Network::from_graph(&graph, Some(&[1.0, 2.0])).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_edge_out_of_range() {
        let err = Network::from_edges(2, &[(0, 5, 1.0)], false).unwrap_err();
        assert_eq!(err, Error::NodeOutOfRange { id: 5, n_nodes: 2 });
    }

    #[test]
    fn test_induced_subnetwork() {
        // Path 0-1-2-3, keep {1, 2, 3}
        let net =
            Network::from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)], false).unwrap();
        let sub = net.induced(&[1, 2, 3]);

        assert_eq!(sub.node_count(), 3);
        assert_eq!(sub.edge_count(), 2);
        assert_eq!(sub.in_strength(), &[1.0, 2.0, 1.0]);
        assert_eq!(sub.in_neighbors(0), &[(1, 1.0)]);
    }
}
