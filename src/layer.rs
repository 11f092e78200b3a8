// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A layer (level): an arrival-ordered, at-most-`NUM_RUNS` collection of
//! runs. Index `current_run - 1` is the newest run; runs within a layer
//! are not globally sorted relative to one another.
//!
//! State machine: `Empty` (`current_run == 0`) / `Partial`
//! (`0 < current_run < NUM_RUNS`) / `Full` (`current_run == NUM_RUNS`).
//! `add_run`/`add_run_from_buffer` move `Empty`/`Partial` towards
//! `Partial`/`Full`; `merge` is only ever invoked on `Full` and resets
//! the layer back to `Empty`.

use crate::{
    bloom::BloomFilter,
    buffer::{Buffer, LookupResult},
    config::Config,
    fence::FenceArray,
    fs::FileSystem,
    merge,
    run::Run,
    Result,
};

/// One level of the tree.
#[derive(Debug)]
pub struct Layer {
    rank: usize,
    runs: Vec<Run>,
}

impl Layer {
    /// Creates an empty layer at `rank`.
    #[must_use]
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            runs: Vec::new(),
        }
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of runs currently held (`current_run` in the source's
    /// terms).
    #[must_use]
    pub fn current_run(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    #[must_use]
    pub fn is_full(&self, config: &Config) -> bool {
        self.runs.len() >= config.num_runs()
    }

    fn run_file_name(&self, slot: usize) -> String {
        format!("run_{}_{}", self.rank, slot)
    }

    fn temp_file_name(&self) -> String {
        format!("run_{}_temp", self.rank)
    }

    /// Flushes a full buffer into this layer as a new run. Precondition:
    /// `buf` is sorted and at capacity. Returns `true` iff the layer is
    /// now full.
    pub fn add_run_from_buffer(
        &mut self,
        fs: &dyn FileSystem,
        config: &Config,
        buf: &Buffer,
    ) -> Result<bool> {
        let fpr = config.has_bloom_filter(self.rank).then_some(config.fprate0);
        let name = self.run_file_name(self.runs.len());

        let run = Run::write_new(fs, name, buf.records(), fpr, config.kv_pairs_per_page)?;

        log::trace!(
            "layer {} absorbed buffer flush as {} ({} records)",
            self.rank,
            run.name(),
            run.size()
        );

        self.runs.push(run);
        Ok(self.is_full(config))
    }

    /// Promotes `source_name` (a completed merge's temp file) into this
    /// layer, renaming it to its slot name. Returns `true` iff the layer
    /// is now full.
    ///
    /// A rename failure is filesystem-warn, not filesystem-fatal (spec
    /// §7): it is logged and the run is still recorded as promoted under
    /// its new name rather than aborting the caller's `put`/`del`.
    pub fn add_run(
        &mut self,
        fs: &dyn FileSystem,
        config: &Config,
        source_name: &str,
        size: usize,
        sketch: Option<BloomFilter>,
        fence: Option<FenceArray>,
    ) -> Result<bool> {
        let name = self.run_file_name(self.runs.len());

        if let Err(e) = fs.rename(source_name, &name) {
            log::warn!("rename of {source_name} to {name} failed: {e}");
        }

        log::debug!(
            "promoted {source_name} to {name} at layer {} ({size} records)",
            self.rank
        );

        self.runs.push(Run::from_parts(name, size, sketch, fence));
        Ok(self.is_full(config))
    }

    /// Merges all of this (full) layer's runs into a single sorted,
    /// key-unique run written to a temp file, then resets the layer.
    /// The caller (the tree) is responsible for promoting the returned
    /// file into the next layer via [`Layer::add_run`].
    ///
    /// # Panics
    ///
    /// This is only ever called when the layer is full; callers must
    /// check [`Layer::is_full`] first.
    pub fn merge(
        &mut self,
        fs: &dyn FileSystem,
        config: &Config,
    ) -> Result<(String, usize, Option<BloomFilter>, Option<FenceArray>)> {
        debug_assert!(self.is_full(config), "merge only runs on a full layer");

        let mut inputs = Vec::with_capacity(self.runs.len());
        for run in &self.runs {
            inputs.push(run.read_all(fs)?);
        }

        let merged = merge::merge_runs(&inputs);

        log::debug!(
            "merging layer {} ({} runs, {} records in, {} records out)",
            self.rank,
            self.runs.len(),
            inputs.iter().map(Vec::len).sum::<usize>(),
            merged.len()
        );

        // The merged run is destined for rank + 1; the sketch's
        // presence and false-positive rate are keyed off the *source*
        // rank per the merge contract (more permissive filters deeper
        // in the tree, since traffic there is rarer).
        let sketch = if config.has_bloom_filter(self.rank + 1) && !merged.is_empty() {
            let fpr = config.fpr_for_rank(self.rank);
            let mut filter = BloomFilter::with_fp_rate(merged.len(), fpr);
            for record in &merged {
                filter.insert(record.key);
            }
            Some(filter)
        } else {
            None
        };

        let fence = FenceArray::build(&merged, config.kv_pairs_per_page);

        let temp_name = self.temp_file_name();
        let bytes = crate::record::encode_all(&merged);
        fs.append_write_new(&temp_name, &bytes)?;

        let size = merged.len();

        self.reset(fs, config);

        Ok((temp_name, size, sketch, fence))
    }

    /// Clears the layer and deletes its run files. A missing file during
    /// delete is a non-fatal, logged error.
    fn reset(&mut self, fs: &dyn FileSystem, config: &Config) {
        for slot in 0..config.num_runs() {
            let name = self.run_file_name(slot);

            if let Err(e) = fs.remove(&name) {
                log::warn!("failed to remove stale run file {name}: {e}");
            }
        }

        self.runs.clear();
    }

    /// Looks up `key`, consulting runs from newest to oldest.
    pub fn get(&self, fs: &dyn FileSystem, config: &Config, key: i32) -> Result<LookupResult> {
        for run in self.runs.iter().rev() {
            let should_check = self.rank >= config.level_with_bf
                || run.sketch().is_none_or(|s| s.possibly_contains(key));

            if !should_check {
                continue;
            }

            match run.check(fs, config.kv_pairs_per_page, key)? {
                LookupResult::Absent => continue,
                found => return Ok(found),
            }
        }

        Ok(LookupResult::Absent)
    }
}

trait OptionExt<T> {
    fn is_none_or(self, f: impl FnOnce(T) -> bool) -> bool;
}

impl<T> OptionExt<T> for Option<T> {
    fn is_none_or(self, f: impl FnOnce(T) -> bool) -> bool {
        match self {
            None => true,
            Some(v) => f(v),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::fs::InMemoryFileSystem;
    use test_log::test;

    fn config() -> Config {
        Config::new(3, 3, 0.01, 4, 3).unwrap()
    }

    fn flush(layer: &mut Layer, fs: &dyn FileSystem, config: &Config, pairs: &[(i32, i32)]) {
        let mut buf = Buffer::new(config.buffer_capacity);
        for &(k, v) in pairs {
            buf.put(k, v);
        }
        buf.sort();
        layer.add_run_from_buffer(fs, config, &buf).unwrap();
    }

    #[test]
    fn layer_shape_transitions() {
        let config = config();
        let fs = InMemoryFileSystem::new();
        let mut layer = Layer::new(0);

        assert!(layer.is_empty());
        flush(&mut layer, &fs, &config, &[(1, 1), (2, 2), (3, 3)]);
        assert!(!layer.is_full(&config));
        flush(&mut layer, &fs, &config, &[(4, 4), (5, 5), (6, 6)]);
        assert!(!layer.is_full(&config));
        flush(&mut layer, &fs, &config, &[(7, 7), (8, 8), (9, 9)]);
        assert!(layer.is_full(&config));
    }

    #[test]
    fn merge_preserves_newest_wins() {
        let config = config();
        let fs = InMemoryFileSystem::new();
        let mut layer = Layer::new(0);

        flush(&mut layer, &fs, &config, &[(4, 8), (2, 4), (1, 90)]);
        flush(&mut layer, &fs, &config, &[(4, 5), (5, 8), (20, 9)]);
        flush(&mut layer, &fs, &config, &[(6, 1), (7, 2), (8, 3)]);

        assert!(layer.is_full(&config));

        let (name, size, _, _) = layer.merge(&fs, &config).unwrap();
        assert_eq!(size, 8);
        assert!(layer.is_empty());

        let bytes = fs.read_at(&name, 0, size, crate::record::RECORD_STRIDE).unwrap();
        let merged = crate::record::decode_all(&bytes).unwrap();
        let result: Vec<_> = merged.into_iter().map(|r| (r.key, r.value)).collect();
        assert_eq!(
            result,
            vec![(1, 90), (2, 4), (4, 5), (5, 8), (6, 1), (7, 2), (8, 3), (20, 9)]
        );
    }

    #[test]
    fn get_walks_newest_to_oldest() {
        let config = config();
        let fs = InMemoryFileSystem::new();
        let mut layer = Layer::new(0);

        flush(&mut layer, &fs, &config, &[(1, 1), (2, 2), (3, 3)]);
        flush(&mut layer, &fs, &config, &[(1, 100), (4, 4), (5, 5)]);

        assert_eq!(layer.get(&fs, &config, 1).unwrap(), LookupResult::Found(100));
        assert_eq!(layer.get(&fs, &config, 3).unwrap(), LookupResult::Found(3));
        assert_eq!(layer.get(&fs, &config, 99).unwrap(), LookupResult::Absent);
    }
}
