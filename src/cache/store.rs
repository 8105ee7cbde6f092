use std::{fs, io::ErrorKind, path::Path};

use tracing::{debug, warn};

use crate::common::write_atomic;

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Hit(T),
    Miss,
}

impl<T> Lookup<T> {
    #[inline] pub fn is_hit(&self) -> bool { matches!(self, Self::Hit(_)) }

    /// Convert to an `Option`, dropping the distinction between kinds of miss.
    pub fn hit(self) -> Option<T> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Miss => None,
        }
    }
}

/// Read and decode an artifact. Every failure is a miss; failures on a file
/// that exists are logged.
pub(crate) fn read_artifact<T>(path: &Path, decode: impl FnOnce(&[u8]) -> anyhow::Result<T>) -> Lookup<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "cache miss");
            return Lookup::Miss;
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "unreadable cache artifact, treating as miss");
            return Lookup::Miss;
        }
    };

    match decode(&bytes) {
        Ok(value) => {
            debug!(path = %path.display(), bytes = bytes.len(), "cache hit");
            Lookup::Hit(value)
        }
        Err(err) => {
            warn!(path = %path.display(), err = format!("{err:#}"), "corrupt cache artifact, treating as miss");
            Lookup::Miss
        }
    }
}

/// Persist an artifact. Failures are logged and otherwise ignored.
pub(crate) fn write_artifact(path: &Path, encode: impl FnOnce() -> anyhow::Result<Vec<u8>>) {
    match encode().and_then(|bytes| write_atomic(path, &bytes)) {
        Ok(()) => debug!(path = %path.display(), "wrote cache artifact"),
        Err(err) => warn!(path = %path.display(), err = format!("{err:#}"), "failed to write cache artifact"),
    }
}
