// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A membership sketch (Bloom filter) sized by entry count and a target
//! false-positive rate, with no false negatives.

mod bit_array;

use bit_array::BitArray;

/// Two hashes used for double hashing, avoiding the cost of `k`
/// independent hash functions.
///
/// See <https://fjall-rs.github.io/post/bloom-filter-hash-sharing> for
/// the technique this crate's filter borrows.
type CompositeHash = (u64, u64);

/// A standard Bloom filter over `i32` keys.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BloomFilter {
    inner: BitArray,

    /// Bit count.
    m: usize,

    /// Number of hash functions.
    k: usize,
}

#[allow(clippy::len_without_is_empty)]
impl BloomFilter {
    /// Constructs a filter sized to hold `n` items at false-positive rate
    /// `fpr`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    #[must_use]
    pub fn with_fp_rate(n: usize, fpr: f64) -> Self {
        use std::f64::consts::LN_2;

        assert!(n > 0, "bloom filter must be sized for at least one item");

        // Some sensible minimum to avoid a degenerate zero-bit filter.
        let fpr = fpr.max(0.000_001);

        let m = Self::calculate_m(n, fpr);
        let bits_per_key = (m / n).max(1);
        let k = (((bits_per_key as f64) * LN_2) as usize).max(1);

        Self {
            inner: BitArray::with_capacity(m.div_ceil(8)),
            m,
            k,
        }
    }

    fn calculate_m(n: usize, fp_rate: f64) -> usize {
        use std::f64::consts::LN_2;

        let n = n as f64;
        let ln2_squared = LN_2.powi(2);
        let numerator = n * fp_rate.ln();
        let m = -(numerator / ln2_squared);

        // Round up to the next byte.
        ((m / 8.0).ceil() * 8.0) as usize
    }

    /// Returns the size of the filter in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the key may be contained. Never has a false
    /// negative.
    #[must_use]
    pub fn possibly_contains(&self, key: i32) -> bool {
        self.contains_hash(Self::hash(key))
    }

    /// Adds `key` to the filter.
    pub fn insert(&mut self, key: i32) {
        self.set_with_hash(Self::hash(key));
    }

    /// Clears every bit, as if the filter had just been constructed.
    pub fn reset(&mut self) {
        self.inner.clear();
    }

    fn contains_hash(&self, (mut h1, mut h2): CompositeHash) -> bool {
        for i in 0..(self.k as u64) {
            let idx = h1 % (self.m as u64);

            if !self.inner.get(idx as usize) {
                return false;
            }

            h1 = h1.wrapping_add(h2);
            h2 = h2.wrapping_add(i);
        }

        true
    }

    fn set_with_hash(&mut self, (mut h1, mut h2): CompositeHash) {
        for i in 0..(self.k as u64) {
            let idx = h1 % (self.m as u64);
            self.inner.set(idx as usize, true);

            h1 = h1.wrapping_add(h2);
            h2 = h2.wrapping_add(i);
        }
    }

    fn hash(key: i32) -> CompositeHash {
        let bytes = key.to_le_bytes();
        let h0 = xxhash_rust::xxh3::xxh3_128(&bytes);
        let h1 = (h0 >> 64) as u64;
        let h2 = h0 as u64;
        (h1, h2)
    }
}
