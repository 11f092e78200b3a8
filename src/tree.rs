// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The tree driver: sequences writes through the buffer and the
//! cascading flush across levels, and walks buffer → level 0 → … on
//! read.

use std::{path::Path, sync::Arc};

use crate::{
    buffer::{Buffer, LookupResult},
    config::Config,
    fs::{FileSystem, StdFileSystem},
    layer::Layer,
    Result,
};

/// A buffer plus a growable sequence of layers with monotonically
/// increasing rank. Layer 0 always exists.
///
/// The tree is the sole mutator of its run-file namespace; it is not
/// safe to share a working directory between two `Tree` instances.
#[derive(Debug)]
pub struct Tree {
    fs: Arc<dyn FileSystem>,
    config: Config,
    buffer: Buffer,
    layers: Vec<Layer>,
}

impl Tree {
    /// Constructs a tree over an arbitrary [`FileSystem`] collaborator,
    /// e.g. an in-memory double in tests.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>, config: Config) -> Self {
        Self {
            fs,
            buffer: Buffer::new(config.buffer_capacity),
            config,
            layers: vec![Layer::new(0)],
        }
    }

    /// Constructs a tree rooted at `path` on the real filesystem.
    ///
    /// The directory is assumed to be empty or exclusively owned by this
    /// tree: existing `run_*` files are neither discovered nor
    /// validated.
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let fs = StdFileSystem::new(path.as_ref())?;
        Ok(Self::new(Arc::new(fs), config))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of layers currently allocated.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Inserts or overwrites `key` with `value`. May trigger a cascading
    /// flush if the buffer fills.
    pub fn put(&mut self, key: i32, value: i32) -> Result<()> {
        if self.buffer.put(key, value) {
            self.flush()?;
        }
        Ok(())
    }

    /// Marks `key` as deleted. May trigger a cascading flush if the
    /// buffer fills.
    pub fn del(&mut self, key: i32) -> Result<()> {
        if self.buffer.del(key) {
            self.flush()?;
        }
        Ok(())
    }

    /// Looks up `key`: the buffer first, then each layer from rank 0
    /// upward, returning on the first live value or tombstone.
    pub fn get(&self, key: i32) -> Result<Option<i32>> {
        match self.buffer.get(key) {
            LookupResult::Found(v) => return Ok(Some(v)),
            LookupResult::Tombstoned => return Ok(None),
            LookupResult::Absent => {}
        }

        for layer in &self.layers {
            match layer.get(&*self.fs, &self.config, key)? {
                LookupResult::Found(v) => return Ok(Some(v)),
                LookupResult::Tombstoned => return Ok(None),
                LookupResult::Absent => continue,
            }
        }

        Ok(None)
    }

    /// Returns every live (non-tombstone) record in the buffer with
    /// `lo <= key < hi`. Range queries over persisted layers are not
    /// supported: once a run is written, only point lookups reach it.
    #[must_use]
    pub fn range(&self, lo: i32, hi: i32) -> Vec<(i32, i32)> {
        self.buffer
            .range(lo, hi)
            .into_iter()
            .map(|r| (r.key, r.value))
            .collect()
    }

    /// Sorts the buffer and pushes it into level 0, then drives the
    /// cascading merge: while a level is full and a successor exists,
    /// merge into the successor; if the cascade reaches the deepest
    /// existing level and it is still full, append a new empty level
    /// and merge into that.
    fn flush(&mut self) -> Result<()> {
        log::debug!("buffer full, flushing ({} records)", self.buffer.len());

        self.buffer.sort();
        self.layers[0].add_run_from_buffer(&*self.fs, &self.config, &self.buffer)?;
        self.buffer.clear();

        if !self.layers[0].is_full(&self.config) {
            return Ok(());
        }

        let mut level = 0;

        while level + 1 < self.layers.len() && self.layers[level].is_full(&self.config) {
            let (name, size, sketch, fence) = self.layers[level].merge(&*self.fs, &self.config)?;

            let became_full =
                self.layers[level + 1].add_run(&*self.fs, &self.config, &name, size, sketch, fence)?;

            if became_full {
                level += 1;
            } else {
                break;
            }
        }

        if self.layers[level].is_full(&self.config) {
            let new_rank = self.layers.len();
            self.layers.push(Layer::new(new_rank));

            let (name, size, sketch, fence) = self.layers[level].merge(&*self.fs, &self.config)?;
            self.layers[level + 1].add_run(&*self.fs, &self.config, &name, size, sketch, fence)?;

            log::debug!("cascade grew the tree to {} layers", self.layers.len());
        }

        Ok(())
    }
}
