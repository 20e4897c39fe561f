//! Staged-mutation label store for one candidate clustering.
//!
//! A [`Partition`] keeps two label vectors:
//!
//! - `reference`: the committed labels. Scoring reads only from here.
//! - `stage`: proposed labels. Operators write only here.
//!
//! [`Partition::commit`] copies `stage` into `reference` and rebuilds the
//! label bookkeeping. Because every proposal made during a pass was computed
//! against the same `reference`, the order in which nodes are visited within
//! a pass cannot affect the result: the update is synchronous.
//!
//! ```text
//!   score(node) ──reads──► reference ◄──copy── commit ◄── stage ◄──writes── stage_label
//! ```

use crate::error::{Error, Result};

/// One clustering candidate.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Committed label per node.
    reference: Vec<usize>,
    /// Proposed label per node; equals `reference` right after a commit.
    stage: Vec<usize>,
    /// Score of each node's most recently staged label.
    label_quality: Vec<f64>,
    /// `label_mask[l]` is true when label `l` is in use (or freshly minted).
    label_mask: Vec<bool>,
    /// Labels retired since the last commit; not reusable until then.
    retired: Vec<usize>,
    /// Committed member count per label id.
    sizes: Vec<usize>,
    n_labels: usize,
    max_label: usize,
}

impl Partition {
    /// Create a partition that takes ownership of `initial_labels`.
    pub fn new(initial_labels: Vec<usize>) -> Result<Self> {
        if initial_labels.is_empty() {
            return Err(Error::EmptyInput);
        }

        let n = initial_labels.len();
        let mut partition = Self {
            stage: initial_labels.clone(),
            reference: initial_labels,
            label_quality: vec![0.0; n],
            label_mask: Vec::new(),
            retired: Vec::new(),
            sizes: Vec::new(),
            n_labels: 0,
            max_label: 0,
        };
        partition.update_label_mask();
        Ok(partition)
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.reference.len()
    }

    /// Number of labels in use.
    pub fn n_labels(&self) -> usize {
        self.n_labels
    }

    /// Upper bound on label ids in `reference` and `stage`.
    ///
    /// Equal to the largest committed label right after a commit; minting
    /// can raise it before the next commit, retiring never lowers it.
    pub fn max_label(&self) -> usize {
        self.max_label
    }

    /// Committed label of `node`.
    pub fn label(&self, node: usize) -> usize {
        self.reference[node]
    }

    /// Committed labels of all nodes.
    pub fn reference(&self) -> &[usize] {
        &self.reference
    }

    /// Staged labels of all nodes.
    pub fn stage(&self) -> &[usize] {
        &self.stage
    }

    /// Quality of each node's most recently staged label.
    pub fn label_quality(&self) -> &[f64] {
        &self.label_quality
    }

    /// Whether `label` is currently active.
    pub fn is_active(&self, label: usize) -> bool {
        self.label_mask.get(label).copied().unwrap_or(false)
    }

    /// Active label ids in ascending order.
    pub fn active_labels(&self) -> Vec<usize> {
        self.label_mask
            .iter()
            .enumerate()
            .filter(|(_, &used)| used)
            .map(|(l, _)| l)
            .collect()
    }

    /// Number of committed members of `label`.
    pub fn community_size(&self, label: usize) -> usize {
        self.sizes.get(label).copied().unwrap_or(0)
    }

    /// Committed member count per label, indexed by label id.
    pub fn community_sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Propose `label` for `node`, remembering how well it fits.
    ///
    /// Never touches `reference`.
    pub fn stage_label(&mut self, node: usize, label: usize, quality: f64) {
        self.stage[node] = label;
        self.label_quality[node] = quality;
    }

    /// Make staged labels authoritative and rebuild label bookkeeping.
    pub fn commit(&mut self) {
        self.reference.copy_from_slice(&self.stage);
        self.update_label_mask();
    }

    /// Fold one label into another in the stage.
    ///
    /// The label with fewer committed members is absorbed by the larger one
    /// (ties keep `c1`). Returns the surviving label.
    pub fn merge_labels(&mut self, c1: usize, c2: usize) -> usize {
        self.merge_label_pairs(&[(c1, c2)])
            .first()
            .copied()
            .unwrap_or(c1)
    }

    /// Apply several [`merge_labels`](Self::merge_labels) in one pass over
    /// the stage; returns the surviving label of each pair.
    ///
    /// Pairs are resolved in order, so a pair naming an already absorbed
    /// label acts on the label that absorbed it.
    pub fn merge_label_pairs(&mut self, pairs: &[(usize, usize)]) -> Vec<usize> {
        let mut redirect: Vec<usize> = (0..self.label_mask.len()).collect();
        let mut kept = Vec::with_capacity(pairs.len());

        for &(c1, c2) in pairs {
            let (c1, c2) = (resolve(&redirect, c1), resolve(&redirect, c2));
            if c1 == c2 {
                kept.push(c1);
                continue;
            }
            let (keep, drop) = if self.community_size(c2) > self.community_size(c1) {
                (c2, c1)
            } else {
                (c1, c2)
            };
            if drop >= redirect.len() {
                let len = redirect.len();
                redirect.extend(len..=drop);
            }
            redirect[drop] = keep;
            self.free_label(drop);
            kept.push(keep);
        }

        for l in self.stage.iter_mut() {
            *l = resolve(&redirect, *l);
        }
        kept
    }

    /// Move every node flagged in `mask` to a freshly minted label.
    pub fn relabel_mask(&mut self, mask: &[bool]) -> usize {
        debug_assert_eq!(mask.len(), self.n_nodes());
        let label = self.new_label();
        for (l, _) in self.stage.iter_mut().zip(mask).filter(|(_, &m)| m) {
            *l = label;
        }
        label
    }

    /// Move `nodes` to a freshly minted label.
    pub fn relabel_nodes(&mut self, nodes: &[usize]) -> usize {
        let label = self.new_label();
        for &node in nodes {
            self.stage[node] = label;
        }
        label
    }

    /// Mint a label id that is neither active nor pending retirement.
    pub fn new_label(&mut self) -> usize {
        let label = (0..self.label_mask.len())
            .find(|&l| !self.label_mask[l] && !self.retired.contains(&l))
            .unwrap_or(self.label_mask.len());

        if label == self.label_mask.len() {
            self.label_mask.push(true);
        } else {
            self.label_mask[label] = true;
        }
        self.max_label = self.max_label.max(label);
        self.n_labels += 1;
        label
    }

    fn free_label(&mut self, label: usize) {
        if !self.is_active(label) {
            return;
        }
        self.label_mask[label] = false;
        self.retired.push(label);
        self.n_labels -= 1;
    }

    /// Recompute active labels, their sizes, count and the max id from
    /// `reference`.
    pub fn update_label_mask(&mut self) {
        let max_label = self.reference.iter().copied().max().unwrap_or(0);
        self.label_mask.clear();
        self.label_mask.resize(max_label + 1, false);
        self.sizes.clear();
        self.sizes.resize(max_label + 1, 0);
        for &l in &self.reference {
            self.label_mask[l] = true;
            self.sizes[l] += 1;
        }
        self.n_labels = self.label_mask.iter().filter(|&&used| used).count();
        self.max_label = max_label;
        self.retired.clear();
    }

    /// Renumber committed labels to `0..n_labels`, preserving their order.
    pub fn repack_labels(&mut self) {
        let packed = repack(&self.reference);
        self.reference = packed;
        self.stage.copy_from_slice(&self.reference);
        self.update_label_mask();
    }

    /// Copy the committed labels into a snapshot slot.
    pub fn store(&self, slot: &mut Vec<usize>) {
        slot.clear();
        slot.extend_from_slice(&self.reference);
    }
}

/// Follow merge redirections until a label maps to itself.
fn resolve(redirect: &[usize], mut label: usize) -> usize {
    while let Some(&next) = redirect.get(label) {
        if next == label {
            break;
        }
        label = next;
    }
    label
}

/// Renumber labels to consecutive integers starting at 0, preserving order.
pub fn repack(labels: &[usize]) -> Vec<usize> {
    let max_label = labels.iter().copied().max().unwrap_or(0);
    let mut shift = vec![usize::MAX; max_label + 1];
    for &l in labels {
        shift[l] = 0;
    }

    let mut next = 0;
    for s in shift.iter_mut().filter(|s| **s == 0) {
        *s = next;
        next += 1;
    }

    labels.iter().map(|&l| shift[l]).collect()
}
