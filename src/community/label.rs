//! Label specificity scoring.
//!
//! A label is a good fit for a node when the node hears it from its
//! in-neighbors more often than the label's global prevalence predicts:
//!
//! ```text
//! specificity(node, l) = observed(node, l) - k_in(node) × expected(l)
//! ```
//!
//! - `observed(node, l)`: weight of in-edges from neighbors labeled `l`
//! - `k_in(node)`: total observed weight, Σ_l observed(node, l)
//! - `expected(l)`: share of all emitted edge weight that comes from nodes
//!   labeled `l`
//!
//! This is the bias correction behind modularity, applied per node instead
//! of per edge. Every active label is scored, including labels the node
//! never hears, and the maximum wins; ties go to the lowest label id.
//!
//! A node with no inbound weight scores 0 for every label, so it lands on
//! the lowest active label id.

use super::iter::IdIter;
use super::network::Network;
use super::partition::Partition;
use super::rng::RunRng;
use log::trace;
use std::collections::BTreeMap;

/// Scratch state for scoring nodes against one fixed labeling.
pub struct LabelScorer<'a> {
    network: &'a Network,
    /// Global emitted-weight share per label id.
    expected: Vec<f64>,
    /// Observed weight per label id for the node being scored.
    heard: Vec<f64>,
    /// Labels with an entry in `heard` for the current node.
    touched: Vec<usize>,
    marked: Vec<bool>,
}

impl<'a> LabelScorer<'a> {
    /// Prepare a scorer for `labels` (one label per node, ids `<= max_label`).
    pub fn new(network: &'a Network, labels: &[usize], max_label: usize) -> Self {
        let mut expected = vec![0.0; max_label + 1];
        for (&l, &k) in labels.iter().zip(network.out_strength()) {
            expected[l] += k;
        }
        let total: f64 = expected.iter().sum();
        if total != 0.0 {
            for e in expected.iter_mut() {
                *e /= total;
            }
        }

        Self {
            network,
            expected,
            heard: vec![0.0; max_label + 1],
            touched: Vec::new(),
            marked: vec![false; max_label + 1],
        }
    }

    /// Expected share of label `l`.
    pub fn expected(&self, l: usize) -> f64 {
        self.expected[l]
    }

    /// Tally the labels `node` hears under `labels`; returns its inbound weight.
    pub fn observe(&mut self, labels: &[usize], node: usize) -> f64 {
        for &t in &self.touched {
            self.heard[t] = 0.0;
            self.marked[t] = false;
        }
        self.touched.clear();

        let mut k_in = 0.0;
        for &(neighbor, w) in self.network.in_neighbors(node) {
            let l = labels[neighbor];
            if !self.marked[l] {
                self.marked[l] = true;
                self.touched.push(l);
            }
            self.heard[l] += w;
            k_in += w;
        }
        k_in
    }

    /// Specificity of label `l` for the most recently observed node.
    pub fn specificity(&self, l: usize, k_in: f64) -> f64 {
        self.heard[l] - k_in * self.expected[l]
    }
}

/// Stage the most specific label for every node `nodes` yields, then commit.
pub fn find_most_specific_labels<B: AsRef<[usize]>>(
    network: &Network,
    partition: &mut Partition,
    nodes: &mut IdIter<B>,
) {
    let mut scorer = LabelScorer::new(network, partition.reference(), partition.max_label());
    let mut labels = IdIter::all_labels(partition, 1.0);

    for node in nodes.by_ref() {
        let k_in = scorer.observe(partition.reference(), node);

        let mut best: Option<(usize, f64)> = None;
        for label in labels.by_ref() {
            let score = scorer.specificity(label, k_in);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((label, score)),
            }
        }

        if let Some((label, score)) = best {
            partition.stage_label(node, label, score);
        }
    }

    partition.commit();
}

/// Rescore only the `ceil(n * fraction)` nodes with the lowest label quality.
pub fn relabel_worst_nodes(network: &Network, partition: &mut Partition, fraction: f64) {
    let n = partition.n_nodes();
    let k = ((n as f64 * fraction).ceil() as usize).min(n);
    let mut worst = IdIter::k_worst_fit_nodes(partition, k);
    find_most_specific_labels(network, partition, &mut worst);
}

/// Number of sub-labels a community of `size` is split into.
pub fn burst_label_count(size: usize, target_community_size: usize) -> usize {
    (size / target_community_size.max(1)).clamp(2, 10)
}

/// Split the poorly fitting members of large communities into fresh labels.
///
/// The `ceil(n * fraction)` worst-fit nodes are grouped by community; every
/// community with at least `min_community_size` committed members sends its
/// worst-fit nodes, uniformly at random, to one of
/// [`burst_label_count`] freshly minted labels. Returns the number of
/// communities burst.
pub fn burst_large_communities(
    partition: &mut Partition,
    rng: &mut RunRng,
    fraction: f64,
    min_community_size: usize,
    target_community_size: usize,
) -> usize {
    let n = partition.n_nodes();
    let k = ((n as f64 * fraction).ceil() as usize).min(n);
    let worst = IdIter::k_worst_fit_nodes(partition, k);

    let mut large: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &node in worst.as_slice() {
        let l = partition.label(node);
        if partition.community_size(l) >= min_community_size {
            large.entry(l).or_default().push(node);
        }
    }

    for (&label, members) in &large {
        let size = partition.community_size(label);
        let n_new = burst_label_count(size, target_community_size);
        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); n_new];
        for &node in members {
            groups[rng.random_int(0, n_new - 1)].push(node);
        }
        for group in groups.iter().filter(|g| !g.is_empty()) {
            let _ = partition.relabel_nodes(group);
        }
        trace!(
            "burst community {label} ({size} members, {} moved) into {n_new} labels",
            members.len()
        );
    }

    partition.commit();
    large.len()
}

/// Labels ranked by specificity for `node` under a fixed labeling.
///
/// The node's own label always comes first; up to `max_labels - 1` further
/// labels follow, in decreasing specificity, if their score is positive.
pub fn rank_labels(
    scorer: &mut LabelScorer<'_>,
    labels: &[usize],
    node: usize,
    max_labels: usize,
) -> Vec<(usize, f64)> {
    let k_in = scorer.observe(labels, node);
    let own = labels[node];

    let mut others: Vec<(usize, f64)> = scorer
        .touched
        .iter()
        .copied()
        .filter(|&l| l != own)
        .map(|l| (l, scorer.specificity(l, k_in)))
        .filter(|&(_, s)| s > 0.0)
        .collect();
    others.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut ranked = vec![(own, scorer.specificity(own, k_in))];
    ranked.extend(others.into_iter().take(max_labels.saturating_sub(1)));
    ranked
}
