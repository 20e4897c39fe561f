//! Consensus over stored snapshots.
//!
//! Every unordered pair of snapshots is compared once. Workers each produce
//! the similarities of one row of the upper triangle; a single-threaded fold
//! then adds every pair's score to both members' totals. No accumulator is
//! ever written by two workers, and the fold order is fixed, so the choice
//! does not depend on the thread count.

use crate::error::{Error, Result};
use crate::metrics::Similarity;
use log::debug;
use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

fn check_lengths(store: &[Vec<usize>]) -> Result<usize> {
    let first = store.first().ok_or(Error::EmptyInput)?;
    for p in store {
        if p.len() != first.len() {
            return Err(Error::DimensionMismatch {
                expected: first.len(),
                found: p.len(),
            });
        }
    }
    Ok(first.len())
}

fn similarity_row(store: &[Vec<usize>], i: usize, similarity: Similarity) -> Result<Vec<f64>> {
    store[i + 1..]
        .iter()
        .map(|other| similarity.compare(&store[i], other))
        .collect()
}

/// Total similarity of each snapshot to all the others.
pub fn similarity_totals(store: &[Vec<usize>], similarity: Similarity) -> Result<Vec<f64>> {
    let _ = check_lengths(store)?;
    let s = store.len();

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = (0..s)
        .into_par_iter()
        .map(|i| similarity_row(store, i, similarity))
        .collect::<Result<_>>()?;

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = (0..s)
        .map(|i| similarity_row(store, i, similarity))
        .collect::<Result<_>>()?;

    let mut totals = vec![0.0; s];
    for (i, row) in rows.iter().enumerate() {
        for (offset, &score) in row.iter().enumerate() {
            let j = i + 1 + offset;
            totals[i] += score;
            totals[j] += score;
        }
    }
    Ok(totals)
}

/// Index of the snapshot with the highest total similarity to all others.
///
/// The first maximum wins.
pub fn most_representative(store: &[Vec<usize>], similarity: Similarity) -> Result<usize> {
    let totals = similarity_totals(store, similarity)?;

    let mut best = 0;
    for (i, &total) in totals.iter().enumerate().skip(1) {
        if total > totals[best] {
            best = i;
        }
    }

    debug!(
        "consensus: snapshot {best} of {} (total similarity {:.4})",
        store.len(),
        totals[best]
    );
    Ok(best)
}

fn jaccard_per_node(consensus: &[usize], other: &[usize]) -> Vec<f64> {
    let mut joint: HashMap<(usize, usize), usize> = HashMap::new();
    let mut size_c: HashMap<usize, usize> = HashMap::new();
    let mut size_o: HashMap<usize, usize> = HashMap::new();
    for (&c, &o) in consensus.iter().zip(other) {
        *joint.entry((c, o)).or_insert(0) += 1;
        *size_c.entry(c).or_insert(0) += 1;
        *size_o.entry(o).or_insert(0) += 1;
    }

    consensus
        .iter()
        .zip(other)
        .map(|(&c, &o)| {
            let inter = joint[&(c, o)];
            let union = size_c[&c] + size_o[&o] - inter;
            inter as f64 / union as f64
        })
        .collect()
}

/// Per-node stability of `consensus` across `store`.
///
/// For each node, the mean Jaccard overlap between its community in
/// `consensus` and its community in every snapshot. 1.0 means the node kept
/// exactly the same co-members everywhere.
pub fn node_confidence(store: &[Vec<usize>], consensus: &[usize]) -> Result<Vec<f64>> {
    let n = check_lengths(store)?;
    if consensus.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: consensus.len(),
        });
    }

    #[cfg(feature = "parallel")]
    let per_snapshot: Vec<Vec<f64>> = store
        .par_iter()
        .map(|p| jaccard_per_node(consensus, p))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let per_snapshot: Vec<Vec<f64>> = store
        .iter()
        .map(|p| jaccard_per_node(consensus, p))
        .collect();

    let mut confidence = vec![0.0; n];
    for scores in &per_snapshot {
        for (c, s) in confidence.iter_mut().zip(scores) {
            *c += s;
        }
    }
    let s = store.len() as f64;
    for c in confidence.iter_mut() {
        *c /= s;
    }
    Ok(confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_store_picks_first() {
        let store = vec![vec![0, 0, 1, 1]; 6];
        assert_eq!(most_representative(&store, Similarity::Nmi).unwrap(), 0);
        let totals = similarity_totals(&store, Similarity::Nmi).unwrap();
        assert!(totals.iter().all(|&t| t == 5.0));
    }

    #[test]
    fn test_picks_majority() {
        let store = vec![
            vec![0, 1, 0, 1, 0, 1],
            vec![0, 0, 0, 1, 1, 1],
            vec![1, 1, 1, 0, 0, 0],
            vec![0, 0, 0, 1, 1, 2],
        ];
        assert_eq!(most_representative(&store, Similarity::Nmi).unwrap(), 1);
        assert_eq!(
            most_representative(&store, Similarity::AdjustedRand).unwrap(),
            1
        );
    }

    #[test]
    fn test_duplicate_snapshots_pick_first_copy() {
        let a: Vec<usize> = (0..300).map(|i| (i * 7 + i / 13) % 11).collect();
        let b: Vec<usize> = (0..300).map(|i| (i * 13 + i / 7) % 17).collect();
        let c: Vec<usize> = (0..300).map(|i| i % 5).collect();
        let store = vec![a.clone(), a.clone(), a, b, c];

        for _ in 0..50 {
            assert_eq!(most_representative(&store, Similarity::Nmi).unwrap(), 0);
        }
        let totals = similarity_totals(&store, Similarity::Nmi).unwrap();
        assert_eq!(totals[0].to_bits(), totals[1].to_bits());
        assert_eq!(totals[1].to_bits(), totals[2].to_bits());
    }

    #[test]
    fn test_single_snapshot() {
        let store = vec![vec![3, 1, 2]];
        assert_eq!(most_representative(&store, Similarity::Nmi).unwrap(), 0);
    }

    #[test]
    fn test_errors() {
        let empty: Vec<Vec<usize>> = Vec::new();
        assert_eq!(
            most_representative(&empty, Similarity::Nmi).unwrap_err(),
            Error::EmptyInput
        );

        let ragged = vec![vec![0, 1], vec![0, 1, 2]];
        assert_eq!(
            most_representative(&ragged, Similarity::Nmi).unwrap_err(),
            Error::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_node_confidence() {
        let consensus = vec![0, 0, 1, 1];
        let store = vec![vec![0, 0, 1, 1], vec![5, 5, 5, 7]];
        let conf = node_confidence(&store, &consensus).unwrap();

        // Snapshot 2: nodes 0,1 -> {0,1} vs {0,1,2}: 2/3; node 2 -> {2,3} vs {0,1,2}: 1/4;
        // node 3 -> {2,3} vs {3}: 1/2.
        let expected = [(1.0 + 2.0 / 3.0) / 2.0, (1.0 + 2.0 / 3.0) / 2.0, 1.25 / 2.0, 0.75];
        for (c, e) in conf.iter().zip(expected) {
            assert!((c - e).abs() < 1e-12);
        }
    }
}
