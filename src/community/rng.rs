//! Run-local random stream.
//!
//! Every independent run owns exactly one [`RunRng`], seeded from
//! `seed + run_index` before it draws anything. Nothing in the engine reads
//! a global or thread-local generator, so results depend only on the seed
//! and the run index, never on which worker thread picked the run up.
//!
//! The stream is ChaCha8, whose output is fixed by its algorithm rather than
//! by the `rand` version in use.
//!
//! ## Two draws per value
//!
//! [`RunRng::random_int`] draws two integers and returns the first, so every
//! value consumes two positions of the stream. Generators that skip every
//! other output line up position for position with this pattern.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic per-run random stream.
#[derive(Debug, Clone)]
pub struct RunRng {
    inner: ChaCha8Rng,
}

impl RunRng {
    /// Seed a new stream.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Stream for run `run_index` of a bootstrap seeded with `seed`.
    pub fn for_run(seed: u64, run_index: usize) -> Self {
        Self::new(seed.wrapping_add(run_index as u64))
    }

    /// Uniform integer in `low..=high`.
    ///
    /// Consumes two values from the stream; the second is discarded.
    pub fn random_int(&mut self, low: usize, high: usize) -> usize {
        debug_assert!(low <= high);
        let value = self.inner.random_range(low..=high);
        let _ = self.inner.random_range(low..=high);
        value
    }

    /// Shuffle `ids` so that its first `limit` entries are a uniform random
    /// sample (in uniform random order) of the whole slice.
    ///
    /// Positions past `limit` are left holding the unselected remainder.
    pub fn partial_shuffle(&mut self, ids: &mut [usize], limit: usize) {
        let n = ids.len();
        if n < 2 {
            return;
        }
        for i in 0..limit.min(n - 1) {
            let j = self.random_int(i, n - 1);
            ids.swap(i, j);
        }
    }
}
