// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The recency-preserving k-way merge.
//!
//! A canonical min-heap k-way merge reorders equal keys arbitrarily. Runs
//! are ordered by arrival (index `0` oldest, last index newest) and ties
//! between runs must resolve in favor of the newest one, so this merge
//! uses a linear frontier scan instead of a heap: at each step, every run
//! whose current key equals the overall minimum is a "winner", and the
//! highest-indexed winner — the newest run among the ties — is the one
//! actually emitted. All winners still advance their cursor, so
//! duplicate keys across runs are consumed together and never reappear
//! in the output.

use crate::record::Record;

/// Merges `runs` (each already key-sorted, newest run last) into a
/// single key-sorted, key-unique sequence, keeping the record from the
/// newest contributing run on any tie.
#[must_use]
pub fn merge_runs(runs: &[Vec<Record>]) -> Vec<Record> {
    let mut cursors: Vec<usize> = vec![0; runs.len()];
    let mut exhausted: Vec<bool> = runs.iter().map(|r| r.is_empty()).collect();
    let mut active = exhausted.iter().filter(|e| !**e).count();

    let total: usize = runs.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total);

    while active > 0 {
        let mut min_key: Option<i32> = None;

        for (i, run) in runs.iter().enumerate() {
            if exhausted[i] {
                continue;
            }

            #[allow(clippy::indexing_slicing)]
            let key = run[cursors[i]].key;

            let is_new_min = match min_key {
                None => true,
                Some(m) => key < m,
            };

            if is_new_min {
                min_key = Some(key);
            }
        }

        #[allow(clippy::expect_used)]
        let min_key = min_key.expect("active > 0 implies at least one run has a current key");

        let mut winner: Option<usize> = None;

        for (i, run) in runs.iter().enumerate() {
            if exhausted[i] {
                continue;
            }

            #[allow(clippy::indexing_slicing)]
            let key = run[cursors[i]].key;

            if key == min_key {
                // Highest index among ties wins: runs are ordered oldest
                // to newest, so the last winner scanned is the newest.
                winner = Some(i);

                #[allow(clippy::indexing_slicing)]
                {
                    cursors[i] += 1;
                }

                if cursors[i] == run.len() {
                    exhausted[i] = true;
                    active -= 1;
                }
            }
        }

        #[allow(clippy::expect_used)]
        let winner = winner.expect("min_key was found in some run");

        #[allow(clippy::indexing_slicing)]
        let emitted = runs[winner][cursors[winner] - 1];
        out.push(emitted);
    }

    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use test_log::test;

    fn live(pairs: &[(i32, i32)]) -> Vec<Record> {
        pairs.iter().map(|&(k, v)| Record::live(k, v)).collect()
    }

    #[test]
    fn merge_is_sorted_and_unique() {
        // run 0 (oldest) ... run 2 (newest)
        let r0 = live(&[(1, 90), (3, 30)]);
        let r1 = live(&[(4, 8), (2, 4)]);
        let r2 = live(&[(4, 5), (5, 8), (20, 9)]);

        let merged = merge_runs(&[r0, r1, r2]);
        let keys: Vec<_> = merged.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5, 20]);
    }

    #[test]
    fn newest_run_wins_ties() {
        let r0 = live(&[(4, 8), (2, 4), (1, 90)]);
        let r1 = live(&[(4, 5), (5, 8), (20, 9)]);

        let mut sorted0 = r0.clone();
        sorted0.sort_unstable_by_key(|r| r.key);
        let mut sorted1 = r1.clone();
        sorted1.sort_unstable_by_key(|r| r.key);

        let merged = merge_runs(&[sorted0, sorted1]);

        let result: Vec<_> = merged.into_iter().map(|r| (r.key, r.value)).collect();
        assert_eq!(result, vec![(1, 90), (2, 4), (4, 5), (5, 8), (20, 9)]);
    }

    #[test]
    fn preserves_tombstones() {
        let r0 = vec![Record::live(1, 1)];
        let r1 = vec![Record::tombstone(1)];

        let merged = merge_runs(&[r0, r1]);
        assert_eq!(merged, vec![Record::tombstone(1)]);
    }

    #[test]
    fn empty_runs_are_skipped() {
        let r0: Vec<Record> = vec![];
        let r1 = live(&[(1, 1)]);
        let r2: Vec<Record> = vec![];

        let merged = merge_runs(&[r0, r1, r2]);
        assert_eq!(merged, vec![Record::live(1, 1)]);
    }

    #[test]
    fn output_size_bounds() {
        let r0 = live(&[(1, 1), (2, 2)]);
        let r1 = live(&[(2, 20), (3, 3)]);
        let merged = merge_runs(&[r0, r1]);

        assert!(merged.len() <= 4);
        assert!(merged.len() >= 3); // distinct keys: 1, 2, 3
    }
}
