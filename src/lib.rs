// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A K.I.S.S. tiered log-structured merge-tree for fixed-width `i32`
//! keys and values.
//!
//! ##### About
//!
//! This crate implements the core of a tiered-compaction LSM-tree: an
//! in-memory write buffer, a growable sequence of levels each holding up
//! to `size_ratio` immutable runs, and the recency-preserving k-way
//! merge that cascades a full level down into its successor.
//!
//! Writes (`put`/`del`) land in the buffer. When the buffer fills, it is
//! sorted and flushed as a new run into level 0. When a level
//! accumulates `size_ratio` runs, they are merged into one run that is
//! promoted into the next level, which may itself become full and
//! cascade further; if the cascade reaches the bottom of the tree, a new
//! empty level is appended.
//!
//! Reads (`get`) consult the buffer, then each level from rank 0
//! upward, short-circuiting on the first live value or tombstone. Each
//! run carries a Bloom filter (dropped at deep levels, per
//! [`Config::level_with_bf`]) and fence pointers so most lookups touch
//! at most one disk page per consulted run.
//!
//! # Example
//!
//! ```
//! use lsm_kv::{Config, Tree};
//!
//! let dir = tempfile::tempdir()?;
//! let mut tree = Tree::open(dir.path(), Config::default())?;
//!
//! tree.put(1, 100)?;
//! tree.put(2, 200)?;
//! tree.del(1)?;
//!
//! assert_eq!(tree.get(1)?, None);
//! assert_eq!(tree.get(2)?, Some(200));
//! # Ok::<(), lsm_kv::Error>(())
//! ```
//!
//! ##### Non-goals
//!
//! Concurrent access, transactional/snapshot semantics, variable-width
//! keys or values, crash recovery of the tree shape across process
//! restarts, compression, and checksums are all out of scope. See
//! `DESIGN.md` for the full rationale.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::indexing_slicing)]

pub mod bloom;
mod buffer;
mod config;
mod error;
mod fence;
pub mod fs;
mod layer;
#[doc(hidden)]
pub mod merge;
mod record;
mod run;
mod tree;

pub use bloom::BloomFilter;
pub use buffer::{Buffer, LookupResult};
pub use config::Config;
pub use error::{Error, Result};
pub use fence::{FenceArray, FencePointer};
pub use fs::{FileSystem, StdFileSystem};
pub use layer::Layer;
pub use record::{Record, RECORD_STRIDE};
pub use tree::Tree;
