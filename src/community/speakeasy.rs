//! SpeakEasy2 entry point.
//!
//! A call to [`SpeakEasy2::cluster`] runs the whole pipeline:
//!
//! 1. **Bootstrap**: `independent_runs` runs execute on a worker pool. Run `i`
//!    seeds its stream from `seed + i`, draws an initial labeling, and writes
//!    its snapshots into its own `target_partitions` slots of the store.
//! 2. **Consensus**: the snapshot most similar to all others becomes the
//!    top-level membership, with labels repacked to `0..k`.
//! 3. **Subclustering** (`subcluster > 1`): each further level re-clusters
//!    every community of the previous level that has at least `minclust`
//!    members on its induced subnetwork.
//! 4. **Extras**: overlapping labels (`multicommunity > 1`) and per-node
//!    confidence, both computed against the top level.

use super::consensus::{most_representative, node_confidence};
use super::label::{rank_labels, LabelScorer};
use super::modes::{ModeSchedule, Tracker};
use super::network::Network;
use super::operators::SpeakEasyOperators;
use super::options::{Options, Settings};
use super::partition::repack;
use super::rng::RunRng;
use super::run::{run_independent, seed_labels, RunSummary};
use super::traits::CommunityDetection;
use crate::error::{Error, Result};
use crate::metrics::Similarity;
use log::{debug, info};
use petgraph::graph::UnGraph;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// SpeakEasy2 community detection.
#[derive(Debug, Clone, Default)]
pub struct SpeakEasy2 {
    options: Options,
}

/// Result of a clustering call.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakEasyOutput {
    levels: Vec<Vec<usize>>,
    overlapping: Option<Vec<Vec<usize>>>,
    confidence: Option<Vec<f64>>,
    seed: u64,
}

impl SpeakEasyOutput {
    /// Top-level community of every node.
    pub fn membership(&self) -> &[usize] {
        &self.levels[0]
    }

    /// One membership vector per level; level `l + 1` refines level `l`.
    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }

    /// Up to `multicommunity` labels per node, primary label first.
    ///
    /// `None` unless `multicommunity > 1`.
    pub fn overlapping(&self) -> Option<&[Vec<usize>]> {
        self.overlapping.as_deref()
    }

    /// Per-node stability of the top-level membership, in `[0, 1]`.
    ///
    /// `None` unless node confidence was requested.
    pub fn confidence(&self) -> Option<&[f64]> {
        self.confidence.as_deref()
    }

    /// Seed the bootstrap actually used.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of top-level communities.
    pub fn n_communities(&self) -> usize {
        self.levels[0].iter().max().map_or(0, |&m| m + 1)
    }
}

impl SpeakEasy2 {
    /// Clustering with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clustering with explicit options.
    pub fn from_options(options: Options) -> Self {
        Self { options }
    }

    /// Current options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Set the number of independent runs.
    pub fn with_independent_runs(mut self, runs: usize) -> Self {
        self.options.independent_runs = Some(runs);
        self
    }

    /// Set the global seed; 0 draws one at random.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.options.random_seed = Some(seed);
        self
    }

    /// Set the snapshots kept per run.
    pub fn with_target_partitions(mut self, n: usize) -> Self {
        self.options.target_partitions = Some(n);
        self
    }

    /// Set the expected number of clusters.
    pub fn with_target_clusters(mut self, n: usize) -> Self {
        self.options.target_clusters = Some(n);
        self
    }

    /// Set the worker count.
    pub fn with_max_threads(mut self, n: usize) -> Self {
        self.options.max_threads = Some(n);
        self
    }

    /// Set the number of clustering levels.
    pub fn with_subcluster(mut self, levels: usize) -> Self {
        self.options.subcluster = Some(levels);
        self
    }

    /// Report up to `n` labels per node.
    pub fn with_multicommunity(mut self, n: usize) -> Self {
        self.options.multicommunity = Some(n);
        self
    }

    /// Set the minimum community size that is subclustered.
    pub fn with_minclust(mut self, n: usize) -> Self {
        self.options.minclust = Some(n);
        self
    }

    /// Set the burn-in interventions discarded before snapshots; 0 keeps the default.
    pub fn with_discard_transient(mut self, n: usize) -> Self {
        self.options.discard_transient = Some(n);
        self
    }

    /// Compute per-node confidence.
    pub fn with_node_confidence(mut self, enabled: bool) -> Self {
        self.options.node_confidence = enabled;
        self
    }

    /// Set the partition comparator used for consensus.
    pub fn with_similarity(mut self, similarity: Similarity) -> Self {
        self.options.similarity = similarity;
        self
    }

    /// Replace the mode-transition thresholds.
    pub fn with_schedule(mut self, schedule: ModeSchedule) -> Self {
        self.options.schedule = schedule;
        self
    }

    /// Cluster `network`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] for a graph without nodes and
    /// [`Error::DirectedGraph`] for a directed one; both are reported before
    /// any run starts.
    pub fn cluster(&self, network: &Network) -> Result<SpeakEasyOutput> {
        if network.node_count() == 0 {
            return Err(Error::EmptyInput);
        }
        if network.is_directed() {
            return Err(Error::DirectedGraph);
        }

        let settings = self.options.resolve(network.node_count());
        info!(
            "speakeasy2: {} nodes, {} edges, {} runs x {} snapshots, seed {}, {} threads",
            network.node_count(),
            network.edge_count(),
            settings.independent_runs,
            settings.target_partitions,
            settings.random_seed,
            settings.max_threads
        );

        #[cfg(feature = "parallel")]
        {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(settings.max_threads)
                .build()
                .map_err(|e| Error::ThreadPool(e.to_string()))?;
            pool.install(|| self.cluster_with(network, &settings))
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.cluster_with(network, &settings)
        }
    }

    fn cluster_with(&self, network: &Network, settings: &Settings) -> Result<SpeakEasyOutput> {
        let (top, store) = bootstrap(network, settings)?;

        let confidence = if settings.node_confidence {
            Some(node_confidence(&store, &top)?)
        } else {
            None
        };
        drop(store);

        let overlapping = if settings.multicommunity > 1 {
            Some(overlapping_labels(network, &top, settings.multicommunity))
        } else {
            None
        };

        let mut levels = vec![top];
        for level in 1..settings.subcluster {
            let parent = &levels[level - 1];
            let next = self.subcluster_level(network, parent, settings)?;
            debug!(
                "level {level}: {} communities",
                next.iter().max().map_or(0, |&m| m + 1)
            );
            levels.push(next);
        }

        Ok(SpeakEasyOutput {
            levels,
            overlapping,
            confidence,
            seed: settings.random_seed,
        })
    }

    /// Options for re-clustering one community: same seed and pool size,
    /// target cluster count re-derived from the community's size.
    fn level_options(&self, settings: &Settings) -> Options {
        Options {
            random_seed: Some(settings.random_seed),
            max_threads: Some(settings.max_threads),
            target_clusters: None,
            ..self.options.clone()
        }
    }

    /// Refine `parent` by clustering each large enough community on its own.
    fn subcluster_level(
        &self,
        network: &Network,
        parent: &[usize],
        settings: &Settings,
    ) -> Result<Vec<usize>> {
        let n_parent = parent.iter().max().map_or(0, |&m| m + 1);
        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); n_parent];
        for (v, &l) in parent.iter().enumerate() {
            groups[l].push(v);
        }

        let sub_options = self.level_options(settings);

        let mut next = vec![0; parent.len()];
        let mut offset = 0;
        for members in &groups {
            if members.len() < settings.minclust.max(1) {
                for &v in members {
                    next[v] = offset;
                }
                offset += 1;
                continue;
            }

            let sub = network.induced(members);
            let sub_settings = sub_options.resolve(members.len());
            let (labels, _) = bootstrap(&sub, &sub_settings)?;
            for (k, &v) in members.iter().enumerate() {
                next[v] = offset + labels[k];
            }
            offset += labels.iter().max().map_or(0, |&m| m + 1);
        }
        Ok(next)
    }
}

/// Run every independent search on the current pool, then pick the consensus.
///
/// Returns the repacked consensus membership and the full snapshot store.
fn bootstrap(network: &Network, settings: &Settings) -> Result<(Vec<usize>, Vec<Vec<usize>>)> {
    let operators = SpeakEasyOperators::new(
        network.node_count(),
        settings.target_clusters,
        settings.minclust,
    );
    let mut store = vec![Vec::new(); settings.store_len()];

    #[cfg(feature = "parallel")]
    let summaries: Vec<RunSummary> = store
        .par_chunks_mut(settings.target_partitions)
        .enumerate()
        .map(|(i, slots)| run_one(network, settings, &operators, i, slots))
        .collect::<Result<_>>()?;

    #[cfg(not(feature = "parallel"))]
    let summaries: Vec<RunSummary> = store
        .chunks_mut(settings.target_partitions)
        .enumerate()
        .map(|(i, slots)| run_one(network, settings, &operators, i, slots))
        .collect::<Result<_>>()?;

    let short = summaries
        .iter()
        .filter(|s| s.snapshots < settings.target_partitions)
        .count();
    if short > 0 {
        debug!("{short} runs hit the step cap before filling their snapshots");
    }

    let chosen = most_representative(&store, settings.similarity)?;
    let membership = repack(&store[chosen]);
    info!(
        "consensus: snapshot {chosen} of {}, {} communities",
        store.len(),
        membership.iter().max().map_or(0, |&m| m + 1)
    );
    Ok((membership, store))
}

fn run_one(
    network: &Network,
    settings: &Settings,
    operators: &SpeakEasyOperators,
    index: usize,
    slots: &mut [Vec<usize>],
) -> Result<RunSummary> {
    let mut rng = RunRng::for_run(settings.random_seed, index);
    let initial = seed_labels(network.node_count(), settings.target_clusters, &mut rng);
    let tracker = Tracker::new(
        settings.schedule.clone(),
        settings.target_partitions,
        settings.discard_transient,
    );
    let summary = run_independent(network, initial, tracker, operators, &mut rng, slots)?;
    debug!(
        "run {index}: {} steps, {} snapshots, {} labels",
        summary.steps, summary.snapshots, summary.n_labels
    );
    Ok(summary)
}

/// Up to `max_labels` labels per node, ranked by specificity under `membership`.
fn overlapping_labels(network: &Network, membership: &[usize], max_labels: usize) -> Vec<Vec<usize>> {
    let max_label = membership.iter().copied().max().unwrap_or(0);
    let mut scorer = LabelScorer::new(network, membership, max_label);
    (0..membership.len())
        .map(|v| {
            rank_labels(&mut scorer, membership, v, max_labels)
                .into_iter()
                .map(|(l, _)| l)
                .collect()
        })
        .collect()
}

impl CommunityDetection for SpeakEasy2 {
    fn detect<N, E>(&self, graph: &UnGraph<N, E>) -> Result<Vec<usize>> {
        let network = Network::from_graph(graph, None)?;
        Ok(self.cluster(&network)?.levels.swap_remove(0))
    }

    fn detect_weighted<N>(&self, graph: &UnGraph<N, f64>) -> Result<Vec<usize>> {
        let network = Network::from_weighted_graph(graph)?;
        Ok(self.cluster(&network)?.levels.swap_remove(0))
    }
}
