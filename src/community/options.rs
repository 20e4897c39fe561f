//! Run configuration.
//!
//! [`Options`] mirrors what a caller may leave unset; [`Options::resolve`]
//! turns it into concrete [`Settings`] for a graph of a given size.
//!
//! | field | default |
//! |-------|---------|
//! | `independent_runs` | 10 |
//! | `subcluster` | 1 |
//! | `multicommunity` | 1 |
//! | `target_partitions` | 5 |
//! | `target_clusters` | `n` if `n < 10`, else `max(10, n / 100)` |
//! | `minclust` | 5 |
//! | `discard_transient` | 3 |
//! | `random_seed` | drawn from the process RNG in `1..=9999` |
//! | `max_threads` | rayon's thread count |
//! | `node_confidence` | false |

use super::modes::ModeSchedule;
use crate::metrics::Similarity;
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Caller-facing configuration; `None` or zero means "use the default".
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Options {
    /// Number of independent runs.
    pub independent_runs: Option<usize>,
    /// Number of clustering levels (1 = no subclustering).
    pub subcluster: Option<usize>,
    /// Maximum labels reported per node.
    pub multicommunity: Option<usize>,
    /// Snapshots kept per run.
    pub target_partitions: Option<usize>,
    /// Expected number of clusters.
    pub target_clusters: Option<usize>,
    /// Minimum community size for subclustering.
    pub minclust: Option<usize>,
    /// Interventions discarded as burn-in before snapshots are kept.
    pub discard_transient: Option<usize>,
    /// Global seed; run `i` uses `random_seed + i`.
    pub random_seed: Option<u64>,
    /// Worker threads.
    pub max_threads: Option<usize>,
    /// Compute a per-node stability score.
    pub node_confidence: bool,
    /// Partition comparator used for consensus.
    pub similarity: Similarity,
    /// Mode-transition thresholds.
    pub schedule: ModeSchedule,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Number of independent runs.
    pub independent_runs: usize,
    /// Number of clustering levels.
    pub subcluster: usize,
    /// Maximum labels reported per node.
    pub multicommunity: usize,
    /// Snapshots kept per run.
    pub target_partitions: usize,
    /// Expected number of clusters.
    pub target_clusters: usize,
    /// Minimum community size for subclustering.
    pub minclust: usize,
    /// Burn-in interventions.
    pub discard_transient: usize,
    /// Global seed.
    pub random_seed: u64,
    /// Worker threads.
    pub max_threads: usize,
    /// Compute node confidence.
    pub node_confidence: bool,
    /// Partition comparator.
    pub similarity: Similarity,
    /// Mode-transition thresholds.
    pub schedule: ModeSchedule,
}

impl Settings {
    /// Total snapshot slots in the partition store.
    pub fn store_len(&self) -> usize {
        self.independent_runs * self.target_partitions
    }
}

fn nonzero_or(value: Option<usize>, default: usize) -> usize {
    value.filter(|&v| v > 0).unwrap_or(default)
}

/// Expected cluster count for a graph with `n_nodes` nodes.
pub fn default_target_clusters(n_nodes: usize) -> usize {
    if n_nodes < 10 {
        n_nodes.max(1)
    } else {
        (n_nodes / 100).max(10)
    }
}

fn default_max_threads() -> usize {
    #[cfg(feature = "parallel")]
    {
        rayon::current_num_threads()
    }

    #[cfg(not(feature = "parallel"))]
    {
        1
    }
}

impl Options {
    /// Apply defaults for a graph with `n_nodes` nodes.
    pub fn resolve(&self, n_nodes: usize) -> Settings {
        Settings {
            independent_runs: nonzero_or(self.independent_runs, 10),
            subcluster: nonzero_or(self.subcluster, 1),
            multicommunity: nonzero_or(self.multicommunity, 1),
            target_partitions: nonzero_or(self.target_partitions, 5),
            target_clusters: nonzero_or(self.target_clusters, default_target_clusters(n_nodes)),
            minclust: nonzero_or(self.minclust, 5),
            discard_transient: nonzero_or(self.discard_transient, 3),
            random_seed: self
                .random_seed
                .filter(|&seed| seed > 0)
                .unwrap_or_else(|| rand::rng().random_range(1..=9999)),
            max_threads: nonzero_or(self.max_threads, default_max_threads()),
            node_confidence: self.node_confidence,
            similarity: self.similarity,
            schedule: self.schedule.clone(),
        }
    }
}
