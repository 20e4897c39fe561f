//! Reusable, size-limited traversals over node or label ids.
//!
//! An [`IdIter`] yields a prefix of its backing id sequence. Running off the
//! end returns `None` and rewinds the cursor, so the same iterator can drive
//! several passes.
//!
//! Ownership of the backing sequence is part of the type: `IdIter<Vec<usize>>`
//! owns its ids and may reorder them ([`IdIter::shuffle`]), while
//! `IdIter<&[usize]>` is a read-only view over someone else's ids.

use super::partition::Partition;
use super::rng::RunRng;
use std::cmp::Ordering;

/// Cursor over a prefix of an id sequence.
#[derive(Debug, Clone)]
pub struct IdIter<B = Vec<usize>> {
    ids: B,
    /// Number of ids yielded per pass.
    limit: usize,
    pos: usize,
}

fn prefix_len(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).ceil() as usize).min(n)
}

impl IdIter<Vec<usize>> {
    /// All nodes `0..n`, yielding `ceil(n * fraction)` per pass.
    pub fn all_nodes(n: usize, fraction: f64) -> Self {
        Self {
            ids: (0..n).collect(),
            limit: prefix_len(n, fraction),
            pos: 0,
        }
    }

    /// All active labels of `partition`, yielding `ceil(n_labels * fraction)` per pass.
    pub fn all_labels(partition: &Partition, fraction: f64) -> Self {
        let ids = partition.active_labels();
        let limit = prefix_len(ids.len(), fraction);
        Self { ids, limit, pos: 0 }
    }

    /// The `k` nodes with the lowest label quality.
    ///
    /// Uses partial selection rather than a full sort. Equal qualities are
    /// ordered by node id, so the earlier node wins a tie at the boundary.
    pub fn k_worst_fit_nodes(partition: &Partition, k: usize) -> Self {
        let quality = partition.label_quality();
        let n = quality.len();
        let k = k.min(n);
        let mut ids: Vec<usize> = (0..n).collect();

        if k > 0 && k < n {
            let by_fit = |a: &usize, b: &usize| -> Ordering {
                quality[*a]
                    .total_cmp(&quality[*b])
                    .then_with(|| a.cmp(b))
            };
            let _ = ids.select_nth_unstable_by(k - 1, by_fit);
        }

        Self {
            ids,
            limit: k,
            pos: 0,
        }
    }

    /// Reorder ids so the yielded prefix is a uniform random sample, and rewind.
    pub fn shuffle(&mut self, rng: &mut RunRng) {
        rng.partial_shuffle(&mut self.ids, self.limit);
        self.pos = 0;
    }
}

impl<'a> IdIter<&'a [usize]> {
    /// Borrowed view yielding every id in `ids`.
    pub fn view(ids: &'a [usize]) -> Self {
        Self {
            ids,
            limit: ids.len(),
            pos: 0,
        }
    }
}

impl<B: AsRef<[usize]>> IdIter<B> {
    /// Number of ids yielded per pass.
    pub fn len(&self) -> usize {
        self.limit
    }

    /// Whether a pass yields nothing.
    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }

    /// The ids a pass yields.
    pub fn as_slice(&self) -> &[usize] {
        &self.ids.as_ref()[..self.limit]
    }

    /// Rewind to the start.
    pub fn reset(&mut self) {
        self.pos = 0;
    }
}

impl<B: AsRef<[usize]>> Iterator for IdIter<B> {
    type Item = usize;

    /// Next id, or `None` at the end of a pass (after which the cursor is
    /// back at the start).
    fn next(&mut self) -> Option<usize> {
        if self.pos >= self.limit {
            self.pos = 0;
            return None;
        }
        let id = self.ids.as_ref()[self.pos];
        self.pos += 1;
        Some(id)
    }
}
