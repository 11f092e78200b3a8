// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::error::{Error, Result};

/// Tuning parameters for a [`crate::Tree`].
///
/// Collected into an explicit, validated value (rather than compile-time
/// constants) so a process can run more than one differently-tuned tree
/// shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Maximum number of live slots in the in-memory buffer before it is
    /// flushed to level 0.
    pub buffer_capacity: usize,

    /// Number of runs a level accumulates before it is merged into its
    /// successor. Also referred to as the fanout, or `NUM_RUNS`.
    pub size_ratio: usize,

    /// Base false-positive rate for level 0's Bloom filter. Deeper levels
    /// (below `level_with_bf`) use `fprate0 * size_ratio.pow(rank)`.
    pub fprate0: f64,

    /// Number of records held per on-disk page; governs the granularity
    /// of fence pointers.
    pub kv_pairs_per_page: usize,

    /// First level rank at which Bloom filters are no longer built.
    /// Levels at or beyond this rank rely on fence pointers alone.
    pub level_with_bf: usize,
}

impl Config {
    /// Constructs a new config, validating the invariants the tree
    /// relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any parameter is out of its
    /// valid range.
    pub fn new(
        buffer_capacity: usize,
        size_ratio: usize,
        fprate0: f64,
        kv_pairs_per_page: usize,
        level_with_bf: usize,
    ) -> Result<Self> {
        if size_ratio < 2 {
            return Err(Error::InvalidConfig("size_ratio (NUM_RUNS) must be >= 2"));
        }
        if buffer_capacity < 1 {
            return Err(Error::InvalidConfig("buffer_capacity must be >= 1"));
        }
        if !(fprate0 > 0.0 && fprate0 < 1.0) {
            return Err(Error::InvalidConfig("fprate0 must be in (0, 1)"));
        }
        if kv_pairs_per_page < 1 {
            return Err(Error::InvalidConfig("kv_pairs_per_page must be >= 1"));
        }
        if level_with_bf < 1 {
            return Err(Error::InvalidConfig("level_with_bf must be >= 1"));
        }

        Ok(Self {
            buffer_capacity,
            size_ratio,
            fprate0,
            kv_pairs_per_page,
            level_with_bf,
        })
    }

    /// Number of runs a level holds before it is full (`NUM_RUNS = SIZE_RATIO`).
    #[must_use]
    pub fn num_runs(&self) -> usize {
        self.size_ratio
    }

    /// False-positive rate the Bloom filter at `rank` should target, per
    /// the merge contract: `FPRATE0 * SIZE_RATIO^rank`, more permissive at
    /// deeper, colder levels.
    #[must_use]
    pub fn fpr_for_rank(&self, rank: usize) -> f64 {
        self.fprate0 * (self.size_ratio as f64).powi(rank as i32)
    }

    /// Whether runs at `rank` should carry a Bloom filter at all.
    #[must_use]
    pub fn has_bloom_filter(&self, rank: usize) -> bool {
        rank < self.level_with_bf
    }
}

impl Default for Config {
    /// A small configuration convenient for tests: `BUFFER_CAPACITY = 3`,
    /// `SIZE_RATIO = NUM_RUNS = 3`.
    fn default() -> Self {
        #![allow(clippy::unwrap_used)]
        Self::new(3, 3, 0.01, 4, 3).unwrap()
    }
}
