#[cfg(test)]
mod tests {
    use crate::community::{CommunityDetection, Network, SpeakEasy2};
    use crate::metrics::nmi;
    use crate::{Error, Result};
    use petgraph::graph::UnGraph;

    /// `k` cliques of `size` nodes, consecutive cliques joined by one edge.
    fn cliques(k: usize, size: usize) -> (Network, Vec<usize>) {
        let mut edges = Vec::new();
        for c in 0..k {
            let base = c * size;
            for i in 0..size {
                for j in (i + 1)..size {
                    edges.push((base + i, base + j, 1.0));
                }
            }
            if c + 1 < k {
                edges.push((base + size - 1, base + size, 1.0));
            }
        }
        let truth = (0..k * size).map(|v| v / size).collect();
        (Network::from_edges(k * size, &edges, false).unwrap(), truth)
    }

    fn small() -> SpeakEasy2 {
        SpeakEasy2::new()
            .with_seed(17)
            .with_independent_runs(4)
            .with_target_partitions(3)
    }

    #[test]
    fn test_same_seed_same_result_any_thread_count() -> Result<()> {
        let (net, _) = cliques(3, 6);

        let one = small().with_max_threads(1).cluster(&net)?;
        let four = small().with_max_threads(4).cluster(&net)?;
        let again = small().with_max_threads(4).cluster(&net)?;

        assert_eq!(one, four);
        assert_eq!(four, again);
        Ok(())
    }

    #[test]
    fn test_repeated_calls_identical() -> Result<()> {
        // Cliques plus scattered cross edges, so snapshots differ from one
        // another and consensus has to compare non-trivial scores.
        let mut edges = Vec::new();
        for c in 0..3 {
            let base = c * 20;
            for i in 0..20 {
                for j in (i + 1)..20 {
                    if (i * 31 + j * 17) % 3 != 0 {
                        edges.push((base + i, base + j, 1.0));
                    }
                }
            }
        }
        for v in 0..60 {
            edges.push((v, (v * 37 + 11) % 60, 0.5));
        }
        let net = Network::from_edges(60, &edges, false)?;

        let run = || {
            SpeakEasy2::new()
                .with_seed(5)
                .with_independent_runs(6)
                .with_max_threads(2)
                .cluster(&net)
        };
        let first = run()?;
        for _ in 0..5 {
            assert_eq!(run()?, first);
        }
        Ok(())
    }

    #[test]
    fn test_two_cliques_separate() -> Result<()> {
        let (net, truth) = cliques(2, 8);
        let out = small().with_target_clusters(2).cluster(&net)?;

        assert_eq!(out.membership().len(), 16);
        assert!(nmi(out.membership(), &truth)? > 0.5);
        Ok(())
    }

    #[test]
    fn test_membership_is_repacked() -> Result<()> {
        let (net, _) = cliques(3, 5);
        let out = small().cluster(&net)?;

        let k = out.n_communities();
        let mut seen = vec![false; k];
        for &l in out.membership() {
            seen[l] = true;
        }
        assert!(seen.iter().all(|&s| s));
        Ok(())
    }

    #[test]
    fn test_path_of_four() -> Result<()> {
        let net = Network::from_edges(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)], false)?;
        let out = small().cluster(&net)?;

        assert_eq!(out.membership().len(), 4);
        assert!(out.n_communities() <= 4);
        Ok(())
    }

    #[test]
    fn test_precondition_errors() {
        let directed = Network::from_edges(2, &[(0, 1, 1.0)], true).unwrap();
        assert_eq!(small().cluster(&directed), Err(Error::DirectedGraph));

        let empty = Network::from_edges(0, &[], false).unwrap();
        assert_eq!(small().cluster(&empty), Err(Error::EmptyInput));

        let graph = UnGraph::<(), ()>::new_undirected();
        assert_eq!(small().detect(&graph), Err(Error::EmptyInput));
    }

    #[test]
    fn test_subcluster_levels_refine() -> Result<()> {
        let (net, _) = cliques(2, 10);
        let out = small().with_subcluster(3).with_minclust(4).cluster(&net)?;

        assert_eq!(out.levels().len(), 3);
        for pair in out.levels().windows(2) {
            let (coarse, fine) = (&pair[0], &pair[1]);
            assert_eq!(fine.len(), 20);
            // Nodes sharing a fine label share the coarse label.
            for u in 0..20 {
                for v in 0..20 {
                    if fine[u] == fine[v] {
                        assert_eq!(coarse[u], coarse[v]);
                    }
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_multicommunity() -> Result<()> {
        let (net, _) = cliques(3, 5);
        let out = small().with_multicommunity(2).cluster(&net)?;

        let overlapping = out.overlapping().unwrap();
        assert_eq!(overlapping.len(), 15);
        for (v, labels) in overlapping.iter().enumerate() {
            assert_eq!(labels[0], out.membership()[v]);
            assert!(labels.len() <= 2);
            assert!(labels.iter().all(|&l| l < out.n_communities()));
        }
        Ok(())
    }

    #[test]
    fn test_node_confidence_in_unit_interval() -> Result<()> {
        let (net, _) = cliques(2, 6);
        let out = small().with_node_confidence(true).cluster(&net)?;

        let confidence = out.confidence().unwrap();
        assert_eq!(confidence.len(), 12);
        assert!(confidence.iter().all(|&c| c > 0.0 && c <= 1.0 + 1e-12));
        Ok(())
    }

    #[test]
    fn test_detect_weighted_graph() -> Result<()> {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n: Vec<_> = (0..6).map(|_| graph.add_node(())).collect();
        for (a, b, w) in [
            (0, 1, 3.0),
            (1, 2, 3.0),
            (0, 2, 3.0),
            (3, 4, 3.0),
            (4, 5, 3.0),
            (3, 5, 3.0),
            (2, 3, 0.1),
        ] {
            let _ = graph.add_edge(n[a], n[b], w);
        }

        let labels = small().detect_weighted(&graph)?;
        assert_eq!(labels.len(), 6);
        assert_eq!(labels, small().detect_weighted(&graph)?);
        Ok(())
    }
}
