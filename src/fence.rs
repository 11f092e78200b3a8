// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Fence pointers: one `(min_key, max_key)` summary per on-disk page,
//! used to skip pages whose range excludes the query key.

use crate::record::Record;

/// Summary of one page's key range and its starting record offset
/// within the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FencePointer {
    /// Smallest key on the page.
    pub min_key: i32,

    /// Largest key on the page.
    pub max_key: i32,

    /// Record offset (not byte offset) of the page's first record.
    pub start: usize,
}

/// Ascending, page-aligned, non-overlapping fence pointers covering an
/// entire run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FenceArray(Vec<FencePointer>);

impl FenceArray {
    /// Builds fence pointers over `records` (already key-sorted), one
    /// per `kv_per_page`-sized page.
    ///
    /// Returns `None` if the run fits in a single page — per the run
    /// contract, fence pointers are only built once a run exceeds one
    /// page.
    #[must_use]
    pub fn build(records: &[Record], kv_per_page: usize) -> Option<Self> {
        if records.len() <= kv_per_page {
            return None;
        }

        let pointers = records
            .chunks(kv_per_page)
            .enumerate()
            .map(|(page_idx, page)| {
                #[allow(clippy::expect_used)]
                let min_key = page.first().expect("chunks never yield empty slices").key;
                #[allow(clippy::expect_used)]
                let max_key = page.last().expect("chunks never yield empty slices").key;

                FencePointer {
                    min_key,
                    max_key,
                    start: page_idx * kv_per_page,
                }
            })
            .collect();

        Some(Self(pointers))
    }

    /// Number of fence pointers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Linearly scans for the page whose range contains `key`, returning
    /// its starting record offset.
    #[must_use]
    pub fn find_page(&self, key: i32) -> Option<usize> {
        self.0
            .iter()
            .find(|fence| key >= fence.min_key && key <= fence.max_key)
            .map(|fence| fence.start)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use test_log::test;

    fn records(keys: &[i32]) -> Vec<Record> {
        keys.iter().map(|&k| Record::live(k, k)).collect()
    }

    #[test]
    fn no_fences_for_single_page() {
        let recs = records(&[1, 2, 3]);
        assert!(FenceArray::build(&recs, 4).is_none());
    }

    #[test]
    fn coverage_is_exact_and_non_overlapping() {
        let recs = records(&(0..37).collect::<Vec<_>>());
        let fences = FenceArray::build(&recs, 8).unwrap();
        assert_eq!(fences.len(), 5); // ceil(37/8)

        for record in &recs {
            let start = fences.find_page(record.key).expect("must find a page");
            let end = (start + 8).min(recs.len());
            assert!(recs[start..end].iter().any(|r| r.key == record.key));
        }
    }

    #[test]
    fn key_outside_range_not_found() {
        let recs = records(&(0..20).collect::<Vec<_>>());
        let fences = FenceArray::build(&recs, 5).unwrap();
        assert!(fences.find_page(-1).is_none());
        assert!(fences.find_page(100).is_none());
    }
}
