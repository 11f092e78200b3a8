// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Filesystem abstraction for the run-file collaborator.
//!
//! The tree never touches `std::fs` directly; every operation goes
//! through a [`FileSystem`] so tests can swap in an in-memory double
//! instead of hitting disk.

use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::PathBuf,
    sync::Mutex,
};

/// The four filesystem operations the tree's run files need: create a
/// new file with its full contents, read a record-aligned slice back,
/// rename (used to promote a run up a level), and remove.
pub trait FileSystem: std::fmt::Debug + Send + Sync {
    /// Creates a new file named `name` and writes `bytes` to it in full.
    /// Fails if `name` already exists.
    fn append_write_new(&self, name: &str, bytes: &[u8]) -> io::Result<()>;

    /// Reads `count` records of `stride` bytes each, starting at record
    /// `offset_records`, from file `name`.
    fn read_at(
        &self,
        name: &str,
        offset_records: usize,
        count: usize,
        stride: usize,
    ) -> io::Result<Vec<u8>>;

    /// Renames `old` to `new`.
    fn rename(&self, old: &str, new: &str) -> io::Result<()>;

    /// Removes file `name`.
    fn remove(&self, name: &str) -> io::Result<()>;
}

/// `std::fs`-backed filesystem, rooted at a directory.
#[derive(Debug, Clone)]
pub struct StdFileSystem {
    root: PathBuf,
}

impl StdFileSystem {
    /// Creates a filesystem rooted at `root`. The directory is created
    /// if it does not already exist.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }
}

impl FileSystem for StdFileSystem {
    fn append_write_new(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.root.join(name))?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    fn read_at(
        &self,
        name: &str,
        offset_records: usize,
        count: usize,
        stride: usize,
    ) -> io::Result<Vec<u8>> {
        let mut file = File::open(self.root.join(name))?;
        file.seek(SeekFrom::Start((offset_records * stride) as u64))?;

        let mut buf = vec![0; count * stride];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn rename(&self, old: &str, new: &str) -> io::Result<()> {
        fs::rename(self.root.join(old), self.root.join(new))
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.root.join(name))
    }
}

/// In-memory [`FileSystem`] double, used by unit tests so the merge and
/// flush paths can be exercised without touching disk.
#[doc(hidden)]
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryFileSystem {
    /// Creates an empty in-memory filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn append_write_new(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        #[allow(clippy::unwrap_used)]
        let mut files = self.files.lock().unwrap();

        if files.contains_key(name) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{name} already exists"),
            ));
        }

        files.insert(name.to_owned(), bytes.to_vec());
        Ok(())
    }

    fn read_at(
        &self,
        name: &str,
        offset_records: usize,
        count: usize,
        stride: usize,
    ) -> io::Result<Vec<u8>> {
        #[allow(clippy::unwrap_used)]
        let files = self.files.lock().unwrap();

        let bytes = files
            .get(name)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_owned()))?;

        let start = offset_records * stride;
        let end = start + count * stride;

        if end > bytes.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short read on {name}"),
            ));
        }

        Ok(bytes[start..end].to_vec())
    }

    fn rename(&self, old: &str, new: &str) -> io::Result<()> {
        #[allow(clippy::unwrap_used)]
        let mut files = self.files.lock().unwrap();

        let bytes = files
            .remove(old)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, old.to_owned()))?;

        files.insert(new.to_owned(), bytes);
        Ok(())
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        #[allow(clippy::unwrap_used)]
        let mut files = self.files.lock().unwrap();

        files
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_owned()))
    }
}
