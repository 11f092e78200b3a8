// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The in-memory, unsorted, bounded write buffer every write enters
//! first, and which dominates every persisted run when reading.

use crate::record::Record;

/// Outcome of a buffer lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult {
    /// A live value was found.
    Found(i32),

    /// The key's newest record is a tombstone.
    Tombstoned,

    /// The key does not appear at all.
    Absent,
}

/// An unsorted bounded array of up to `capacity` records, augmented with
/// a size counter. At most one slot per key.
#[derive(Debug, Clone)]
pub struct Buffer {
    slots: Vec<Record>,
    capacity: usize,
}

impl Buffer {
    /// Creates an empty buffer with room for `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Current number of live slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Inserts or overwrites `key` with `value`, clearing any tombstone.
    /// Returns `true` iff the buffer is now at capacity.
    ///
    /// The lookup considers tombstoned slots too (not just live ones) so
    /// that `put` after `del` of the same key reuses the existing slot
    /// instead of appending a second one for the same key.
    pub fn put(&mut self, key: i32, value: i32) -> bool {
        match self.slots.iter_mut().find(|r| r.key == key) {
            Some(slot) => {
                slot.value = value;
                slot.deleted = false;
            }
            None => self.slots.push(Record::live(key, value)),
        }

        self.is_full()
    }

    /// Marks `key` as deleted. Returns `true` iff the buffer is now at
    /// capacity.
    pub fn del(&mut self, key: i32) -> bool {
        match self.slots.iter_mut().find(|r| r.key == key) {
            Some(slot) => slot.deleted = true,
            None => self.slots.push(Record::tombstone(key)),
        }

        self.is_full()
    }

    /// Looks up `key`, scanning from newest to oldest. Since `put`/`del`
    /// keep at most one slot per key, "newest" and "only" coincide here;
    /// the scan direction is kept explicit to match the general contract
    /// that later writes dominate earlier ones.
    #[must_use]
    pub fn get(&self, key: i32) -> LookupResult {
        match self.slots.iter().rev().find(|r| r.key == key) {
            Some(r) if r.deleted => LookupResult::Tombstoned,
            Some(r) => LookupResult::Found(r.value),
            None => LookupResult::Absent,
        }
    }

    /// Returns every non-tombstone record with `lo <= key < hi`. Order is
    /// unspecified; duplicate keys are impossible by construction.
    #[must_use]
    pub fn range(&self, lo: i32, hi: i32) -> Vec<Record> {
        self.slots
            .iter()
            .filter(|r| !r.deleted && r.key >= lo && r.key < hi)
            .copied()
            .collect()
    }

    /// Sorts slots in place by ascending key, in preparation for being
    /// flushed out as a run.
    pub fn sort(&mut self) {
        self.slots.sort_unstable_by_key(|r| r.key);
    }

    /// Returns the sorted slots as a slice, for the caller to hand off to
    /// a [`crate::layer::Layer`] after calling [`Buffer::sort`].
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.slots
    }

    /// Empties the buffer, as happens after it has been flushed to a
    /// run.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use test_log::test;

    #[test]
    fn write_read_buffer_only() {
        let mut buf = Buffer::new(10);
        buf.put(1, 1);
        buf.put(1, 2);
        buf.put(1, 3);
        assert_eq!(buf.get(1), LookupResult::Found(3));
    }

    #[test]
    fn tombstone_masks() {
        let mut buf = Buffer::new(10);
        buf.put(1, 1);
        buf.del(1);
        assert_eq!(buf.get(1), LookupResult::Tombstoned);
    }

    #[test]
    fn resurrection() {
        let mut buf = Buffer::new(10);
        buf.put(1, 10);
        buf.del(1);
        buf.put(1, 20);
        assert_eq!(buf.get(1), LookupResult::Found(20));
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn del_of_absent_key_appends_tombstone() {
        let mut buf = Buffer::new(10);
        buf.del(42);
        assert_eq!(buf.get(42), LookupResult::Tombstoned);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn put_after_del_of_absent_key_reuses_slot() {
        let mut buf = Buffer::new(10);
        buf.del(7);
        buf.put(7, 99);
        assert_eq!(buf.get(7), LookupResult::Found(99));
        assert_eq!(buf.len(), 1, "must not create a second slot for key 7");
    }

    #[test]
    fn fills_at_capacity() {
        let mut buf = Buffer::new(3);
        assert!(!buf.put(1, 1));
        assert!(!buf.put(2, 2));
        assert!(buf.put(3, 3));
        assert!(buf.is_full());
    }

    #[test]
    fn range_excludes_tombstones_and_respects_bounds() {
        let mut buf = Buffer::new(10);
        buf.put(1, 1);
        buf.put(2, 2);
        buf.put(3, 3);
        buf.del(2);

        let mut found: Vec<_> = buf.range(1, 3).into_iter().map(|r| r.key).collect();
        found.sort_unstable();
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn sort_orders_by_key() {
        let mut buf = Buffer::new(10);
        buf.put(3, 30);
        buf.put(1, 10);
        buf.put(2, 20);
        buf.sort();
        let keys: Vec<_> = buf.records().iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }
}
