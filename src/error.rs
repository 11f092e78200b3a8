// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::fmt;

/// Represents errors that can occur while operating the tree.
#[derive(Debug)]
pub enum Error {
    /// I/O error while reading, writing, renaming or removing a run file.
    Io(std::io::Error),

    /// A [`crate::Config`] value failed validation.
    InvalidConfig(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidConfig(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Tree result.
pub type Result<T> = std::result::Result<T, Error>;
