// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The on-disk record format: `(key: i32, value: i32, deleted: bool)`.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// A single key/value/tombstone triple.
///
/// The `deleted` flag encodes a tombstone: the record asserts "no live
/// value for this key as of this record's position in logical time."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    /// The record's key.
    pub key: i32,

    /// The record's value. Meaningless when `deleted` is set.
    pub value: i32,

    /// Whether this record is a tombstone.
    pub deleted: bool,
}

/// Byte width of one encoded record on disk: a little-endian `i32` key,
/// a little-endian `i32` value, and a one-byte tombstone flag.
///
/// Explicit and fixed, rather than derived from in-memory struct layout,
/// so writer and reader agree regardless of platform padding.
pub const RECORD_STRIDE: usize = 9;

impl Record {
    /// Constructs a live (non-tombstone) record.
    #[must_use]
    pub fn live(key: i32, value: i32) -> Self {
        Self {
            key,
            value,
            deleted: false,
        }
    }

    /// Constructs a tombstone record for `key`.
    #[must_use]
    pub fn tombstone(key: i32) -> Self {
        Self {
            key,
            value: 0,
            deleted: true,
        }
    }

    pub(crate) fn encode_into<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i32::<LittleEndian>(self.key)?;
        writer.write_i32::<LittleEndian>(self.value)?;
        writer.write_u8(u8::from(self.deleted))
    }

    pub(crate) fn decode_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let key = reader.read_i32::<LittleEndian>()?;
        let value = reader.read_i32::<LittleEndian>()?;
        let deleted = reader.read_u8()? != 0;
        Ok(Self {
            key,
            value,
            deleted,
        })
    }
}

/// Encodes a full, already-ordered slice of records into a flat byte
/// buffer suitable for a single [`crate::fs::FileSystem::append_write_new`] call.
pub(crate) fn encode_all(records: &[Record]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(records.len() * RECORD_STRIDE);

    for record in records {
        // A Vec<u8> writer never fails.
        #[allow(clippy::expect_used)]
        record
            .encode_into(&mut buf)
            .expect("encoding into a Vec cannot fail");
    }

    buf
}

/// Decodes a flat byte buffer (as produced by a positioned read) back
/// into records.
pub(crate) fn decode_all(bytes: &[u8]) -> io::Result<Vec<Record>> {
    let mut cursor = bytes;
    let count = bytes.len() / RECORD_STRIDE;
    let mut out = Vec::with_capacity(count);

    for _ in 0..count {
        out.push(Record::decode_from(&mut cursor)?);
    }

    Ok(out)
}
