//! One independent stochastic search.
//!
//! A run owns its [`Partition`], [`Tracker`] and [`RunRng`] outright; the
//! only things it shares are the read-only [`Network`] and the snapshot
//! slots it was handed, which no other run touches.

use super::modes::Tracker;
use super::network::Network;
use super::operators::Refinement;
use super::partition::Partition;
use super::rng::RunRng;
use crate::error::Result;
use log::debug;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Time steps executed.
    pub steps: usize,
    /// Snapshots taken when the tracker asked for them.
    pub snapshots: usize,
    /// Labels in the final partition.
    pub n_labels: usize,
}

/// Initial labeling: every node draws a label uniformly from `0..n_labels`.
pub fn seed_labels(n_nodes: usize, n_labels: usize, rng: &mut RunRng) -> Vec<usize> {
    let top = n_labels.max(1) - 1;
    (0..n_nodes).map(|_| rng.random_int(0, top)).collect()
}

/// Drive one partition to termination, writing snapshots into `slots`.
///
/// Snapshots go into `slots` in order. If the run stops before filling
/// every slot (the typical-step cap was hit), the remaining slots receive
/// the final committed partition.
pub fn run_independent<R: Refinement + ?Sized>(
    network: &Network,
    initial_labels: Vec<usize>,
    mut tracker: Tracker,
    refinement: &R,
    rng: &mut RunRng,
    slots: &mut [Vec<usize>],
) -> Result<RunSummary> {
    let mut partition = Partition::new(initial_labels)?;
    let mut saved = 0;
    let mut time = 0;

    loop {
        let mode = tracker.select_mode(time);
        let merged = refinement.apply(mode, network, &mut partition, rng);
        let transition = tracker.record(mode, merged);
        debug!(
            "t={time} mode={mode:?} labels={} merged={merged}",
            partition.n_labels()
        );

        if transition.save_snapshot && saved < slots.len() {
            partition.store(&mut slots[saved]);
            saved += 1;
            debug!("t={time} snapshot {saved}/{}", slots.len());
        }

        time += 1;
        if tracker.terminated() {
            break;
        }
    }

    let snapshots = saved;
    for slot in &mut slots[saved..] {
        partition.store(slot);
    }

    Ok(RunSummary {
        steps: time,
        snapshots,
        n_labels: partition.n_labels(),
    })
}
