use std::{fs, path::{Path, PathBuf}};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::{
    common::write_atomic,
    config::Config,
    error::{Error, Result},
    partition::{GroupAssignment, PartAssignment},
};

/// Named intermediate results persisted as `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.checkpoint_dir.clone())
    }

    #[inline] pub fn dir(&self) -> &Path { &self.dir }

    /// Location of the checkpoint file for `name`.
    pub fn path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && !name.contains(['/', '\\'])
            && !name.contains("..");
        if !valid {
            return Err(Error::InvalidCheckpointName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Return the stored value for `name` if one decodes as `T`; otherwise store
    /// `value` and return it.
    pub fn checkpoint<T: Serialize + DeserializeOwned>(&self, name: &str, value: T) -> Result<T> {
        let path = self.path(name)?;
        if let Some(stored) = self.read(&path) {
            info!(name, "restored checkpoint");
            return Ok(stored);
        }
        self.write(&path, &value)?;
        info!(name, "saved checkpoint");
        Ok(value)
    }

    /// Like [`checkpoint`](Self::checkpoint), but only the identifier-to-group map
    /// of `value` is persisted and returned.
    pub fn checkpoint_assignment(&self, name: &str, value: &impl GroupAssignment) -> Result<PartAssignment> {
        let path = self.path(name)?;
        if let Some(stored) = self.read::<PartAssignment>(&path) {
            info!(name, entries = stored.len(), "restored assignment checkpoint");
            return Ok(stored);
        }
        let assignment = value.group_assignment();
        self.write(&path, &assignment)?;
        info!(name, entries = assignment.len(), "saved assignment checkpoint");
        Ok(assignment)
    }

    fn read<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %path.display(), %err, "no checkpoint");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(path = %path.display(), %err, "unreadable checkpoint, overwriting");
                None
            }
        }
    }

    fn write<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        write_atomic(path, &bytes)
            .map_err(|source| Error::Write { path: path.to_path_buf(), source })
    }
}
