//! Refinement operators dispatched by the mode schedule.
//!
//! The run loop only knows the [`Refinement`] trait; which nodes a typical
//! pass samples, how communities are chosen for bursting, and which pairs
//! get merged are all decided by the implementation. [`SpeakEasyOperators`]
//! is the default.
//!
//! ## Default merge heuristic
//!
//! For communities `a` and `b`, the specificity of `b` for `a` compares the
//! weight `a` receives from `b` with what `b`'s global share predicts:
//!
//! ```text
//! s(a, b) = W(b -> a) - K_in(a) × p(b)
//! ```
//!
//! A pair is a candidate when `s(a, b) + s(b, a) > 0`, which is exactly the
//! condition under which merging them raises modularity. Candidates are
//! merged greedily, best first, each community taking part in at most one
//! merge per step.

use super::iter::IdIter;
use super::label::{burst_large_communities, find_most_specific_labels, relabel_worst_nodes};
use super::modes::Mode;
use super::network::Network;
use super::partition::Partition;
use super::rng::RunRng;
use log::trace;
use std::collections::BTreeMap;

/// Operators a run can apply to its partition.
///
/// Every operator must be total over any valid partition and must leave the
/// partition committed.
pub trait Refinement: Sync {
    /// Rescore most nodes.
    fn typical(&self, network: &Network, partition: &mut Partition, rng: &mut RunRng);

    /// Break up large communities.
    fn bubble(&self, network: &Network, partition: &mut Partition, rng: &mut RunRng);

    /// Merge community pairs; returns the number of pairs merged.
    fn merge(&self, network: &Network, partition: &mut Partition, rng: &mut RunRng) -> usize;

    /// Rescore poorly fitting nodes.
    fn nurture(&self, network: &Network, partition: &mut Partition, rng: &mut RunRng);

    /// Run the operator for `mode`; returns the merge count (0 for non-merge modes).
    fn apply(
        &self,
        mode: Mode,
        network: &Network,
        partition: &mut Partition,
        rng: &mut RunRng,
    ) -> usize {
        match mode {
            Mode::Typical => self.typical(network, partition, rng),
            Mode::Bubble => self.bubble(network, partition, rng),
            Mode::Merge => return self.merge(network, partition, rng),
            Mode::Nurture => self.nurture(network, partition, rng),
        }
        0
    }
}

/// Default operators.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakEasyOperators {
    /// Share of nodes rescored by a typical pass.
    pub node_fraction: f64,
    /// Share of nodes (worst first) rescored by nurture.
    pub nurture_fraction: f64,
    /// Share of nodes (worst first) eligible to move in a burst.
    pub burst_fraction: f64,
    /// Communities at least this large are burst.
    pub min_burst_size: usize,
    /// Community size the burst aims for.
    pub target_community_size: usize,
}

impl SpeakEasyOperators {
    /// Operators tuned for a graph of `n_nodes` expected to hold
    /// `target_clusters` communities.
    pub fn new(n_nodes: usize, target_clusters: usize, minclust: usize) -> Self {
        let target_community_size = (n_nodes / target_clusters.max(1)).max(1);
        Self {
            node_fraction: 0.9,
            nurture_fraction: 0.9,
            burst_fraction: 0.9,
            min_burst_size: target_community_size.max(minclust),
            target_community_size,
        }
    }
}

impl Refinement for SpeakEasyOperators {
    fn typical(&self, network: &Network, partition: &mut Partition, rng: &mut RunRng) {
        let mut nodes = IdIter::all_nodes(partition.n_nodes(), self.node_fraction);
        nodes.shuffle(rng);
        find_most_specific_labels(network, partition, &mut nodes);
    }

    fn bubble(&self, _network: &Network, partition: &mut Partition, rng: &mut RunRng) {
        let _ = burst_large_communities(
            partition,
            rng,
            self.burst_fraction,
            self.min_burst_size,
            self.target_community_size,
        );
    }

    fn merge(&self, network: &Network, partition: &mut Partition, _rng: &mut RunRng) -> usize {
        merge_well_connected_communities(network, partition)
    }

    fn nurture(&self, network: &Network, partition: &mut Partition, _rng: &mut RunRng) {
        relabel_worst_nodes(network, partition, self.nurture_fraction);
    }
}

/// Merge community pairs whose mutual specificity is positive.
///
/// Returns the number of pairs merged.
pub fn merge_well_connected_communities(network: &Network, partition: &mut Partition) -> usize {
    let labels = partition.reference();
    let n_slots = partition.max_label() + 1;

    let mut k_in = vec![0.0; n_slots];
    let mut emitted = vec![0.0; n_slots];
    let mut between: BTreeMap<(usize, usize), f64> = BTreeMap::new();

    for (v, &a) in labels.iter().enumerate() {
        k_in[a] += network.in_strength()[v];
        emitted[a] += network.out_strength()[v];
        for &(u, w) in network.in_neighbors(v) {
            let b = labels[u];
            if b != a {
                *between.entry((b, a)).or_insert(0.0) += w;
            }
        }
    }

    let total: f64 = emitted.iter().sum();
    if total == 0.0 {
        partition.commit();
        return 0;
    }
    let share: Vec<f64> = emitted.iter().map(|e| e / total).collect();

    // Symmetric score per unordered pair.
    let mut scores: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (&(from, to), &w) in &between {
        let (a, b) = (from.min(to), from.max(to));
        *scores
            .entry((a, b))
            .or_insert_with(|| -(k_in[a] * share[b]) - k_in[b] * share[a]) += w;
    }

    let mut candidates: Vec<((usize, usize), f64)> =
        scores.into_iter().filter(|&(_, s)| s > 0.0).collect();
    candidates.sort_by(|x, y| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0)));

    let mut taken = vec![false; n_slots];
    let mut pairs = Vec::new();
    for ((a, b), score) in candidates {
        if taken[a] || taken[b] {
            continue;
        }
        taken[a] = true;
        taken[b] = true;
        trace!("merging communities {a} and {b} (score {score:.4})");
        pairs.push((a, b));
    }

    let _ = partition.merge_label_pairs(&pairs);
    partition.commit();
    pairs.len()
}
