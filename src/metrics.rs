//! Partition comparison.
//!
//! Consensus picks the snapshot most similar to all others, so it needs a
//! symmetric similarity between two label vectors over the same nodes.
//! Label ids are arbitrary: both measures only look at the contingency table,
//! so `[0, 0, 1]` and `[5, 5, 2]` are the same partition.
//!
//! | Metric | Range | Identical partitions |
//! |--------|-------|----------------------|
//! | [`nmi`] | [0, 1] | 1 |
//! | [`ari`] | [-1, 1] | 1 |
//!
//! # References
//!
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)

use crate::error::{Error, Result};
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Partition comparator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Similarity {
    /// Normalized mutual information.
    #[default]
    Nmi,
    /// Adjusted Rand index.
    AdjustedRand,
}

impl Similarity {
    /// Compare two partitions of the same nodes.
    pub fn compare(self, a: &[usize], b: &[usize]) -> Result<f64> {
        match self {
            Similarity::Nmi => nmi(a, b),
            Similarity::AdjustedRand => ari(a, b),
        }
    }
}

/// Contingency counts of two labelings plus their marginals.
///
/// Ordered maps keep every floating-point sum over the table in the same
/// order, so equal inputs give bit-identical scores.
struct Contingency {
    joint: BTreeMap<(usize, usize), usize>,
    rows: BTreeMap<usize, usize>,
    cols: BTreeMap<usize, usize>,
    n: usize,
}

impl Contingency {
    fn new(a: &[usize], b: &[usize]) -> Result<Self> {
        if a.len() != b.len() {
            return Err(Error::DimensionMismatch {
                expected: a.len(),
                found: b.len(),
            });
        }
        if a.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut joint = BTreeMap::new();
        let mut rows = BTreeMap::new();
        let mut cols = BTreeMap::new();
        for (&x, &y) in a.iter().zip(b) {
            *joint.entry((x, y)).or_insert(0) += 1;
            *rows.entry(x).or_insert(0) += 1;
            *cols.entry(y).or_insert(0) += 1;
        }

        Ok(Self {
            joint,
            rows,
            cols,
            n: a.len(),
        })
    }

    /// Both labelings induce the same partition.
    fn is_bijection(&self) -> bool {
        self.joint.len() == self.rows.len() && self.joint.len() == self.cols.len()
    }
}

fn entropy(counts: &BTreeMap<usize, usize>, n: f64) -> f64 {
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum()
}

/// Normalized Mutual Information between two partitions.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
///
/// Identical partitions (up to relabeling) score exactly 1.
///
/// ```rust
/// use speakeasy2::metrics::nmi;
///
/// assert_eq!(nmi(&[0, 0, 1, 1], &[1, 1, 0, 0]).unwrap(), 1.0);
/// assert!(nmi(&[0, 1, 0, 1], &[0, 0, 1, 1]).unwrap() < 0.5);
/// ```
pub fn nmi(a: &[usize], b: &[usize]) -> Result<f64> {
    let table = Contingency::new(a, b)?;
    if table.is_bijection() {
        return Ok(1.0);
    }

    let n = table.n as f64;
    let h_a = entropy(&table.rows, n);
    let h_b = entropy(&table.cols, n);

    let mut mi = 0.0;
    for (&(x, y), &count) in &table.joint {
        let p_joint = count as f64 / n;
        let p_x = table.rows[&x] as f64 / n;
        let p_y = table.cols[&y] as f64 / n;
        mi += p_joint * (p_joint / (p_x * p_y)).ln();
    }

    let denom = h_a + h_b;
    if denom > 0.0 {
        Ok((2.0 * mi / denom).clamp(0.0, 1.0))
    } else {
        Ok(1.0)
    }
}

/// Adjusted Rand Index between two partitions.
///
/// 0 for chance-level agreement, 1 for identical partitions.
pub fn ari(a: &[usize], b: &[usize]) -> Result<f64> {
    let table = Contingency::new(a, b)?;
    if table.is_bijection() {
        return Ok(1.0);
    }

    let sum_comb_ij: f64 = table.joint.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_a: f64 = table.rows.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_b: f64 = table.cols.values().map(|&c| comb2(c) as f64).sum();
    let comb_n = comb2(table.n) as f64;

    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return Ok(1.0);
    }

    Ok((sum_comb_ij - expected) / denom)
}

fn comb2(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}
