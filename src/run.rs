// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A single immutable, sorted, key-unique run plus the accessory
//! structures (Bloom filter, fence pointers) kept in memory for its
//! lifetime.

use crate::{
    bloom::BloomFilter,
    buffer::LookupResult,
    fence::FenceArray,
    fs::FileSystem,
    record::{self, Record, RECORD_STRIDE},
    Result,
};

/// One run's on-disk name plus its in-memory accessory structures.
#[derive(Debug)]
pub struct Run {
    name: String,
    size: usize,
    sketch: Option<BloomFilter>,
    fence: Option<FenceArray>,
}

impl Run {
    /// Writes `records` (already sorted and key-unique) as a fresh run
    /// file named `name`, building a Bloom filter (when `fpr` is
    /// `Some`) and fence pointers (when the run exceeds one page).
    pub fn write_new(
        fs: &dyn FileSystem,
        name: String,
        records: &[Record],
        fpr: Option<f64>,
        kv_pairs_per_page: usize,
    ) -> Result<Self> {
        let sketch = if records.is_empty() {
            None
        } else {
            fpr.map(|fpr| {
                let mut filter = BloomFilter::with_fp_rate(records.len(), fpr);
                for record in records {
                    filter.insert(record.key);
                }
                filter
            })
        };

        let fence = FenceArray::build(records, kv_pairs_per_page);

        let bytes = record::encode_all(records);
        fs.append_write_new(&name, &bytes)?;

        Ok(Self {
            name,
            size: records.len(),
            sketch,
            fence,
        })
    }

    /// Wraps an already-written file (used when a merge's temp file is
    /// promoted into a layer via rename) together with the accessory
    /// structures computed for it.
    #[must_use]
    pub fn from_parts(
        name: String,
        size: usize,
        sketch: Option<BloomFilter>,
        fence: Option<FenceArray>,
    ) -> Self {
        Self {
            name,
            size,
            sketch,
            fence,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn sketch(&self) -> Option<&BloomFilter> {
        self.sketch.as_ref()
    }

    #[must_use]
    pub fn fence(&self) -> Option<&FenceArray> {
        self.fence.as_ref()
    }

    /// Reads the entire run back into memory, in key order. Used by
    /// `merge`, which must load every input run fully.
    pub fn read_all(&self, fs: &dyn FileSystem) -> Result<Vec<Record>> {
        if self.size == 0 {
            return Ok(Vec::new());
        }

        let bytes = fs.read_at(&self.name, 0, self.size, RECORD_STRIDE)?;
        Ok(record::decode_all(&bytes)?)
    }

    /// Looks up `key` in this run, consulting the fence pointers (if any)
    /// to restrict the read to a single page.
    pub fn check(
        &self,
        fs: &dyn FileSystem,
        kv_pairs_per_page: usize,
        key: i32,
    ) -> Result<LookupResult> {
        if self.size == 0 {
            return Ok(LookupResult::Absent);
        }

        let (offset, read_size) = match &self.fence {
            Some(fence) => match fence.find_page(key) {
                Some(start) => (start, kv_pairs_per_page.min(self.size - start)),
                None => return Ok(LookupResult::Absent),
            },
            None => (0, self.size),
        };

        let bytes = fs.read_at(&self.name, offset, read_size, RECORD_STRIDE)?;
        let page = record::decode_all(&bytes)?;

        Ok(match page.iter().find(|r| r.key == key) {
            Some(r) if r.deleted => LookupResult::Tombstoned,
            Some(r) => LookupResult::Found(r.value),
            None => LookupResult::Absent,
        })
    }
}
