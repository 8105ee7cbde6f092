use std::path::PathBuf;

/// Default directory for checkpoint files, relative to the working directory.
pub const DEFAULT_CHECKPOINT_DIR: &str = "checkpoints";

/// Settings shared by the loader and the checkpoint store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `<name>.json` checkpoint files.
    pub checkpoint_dir: PathBuf,
    /// DBF field supplying row identifiers; row indices are used when unset.
    pub id_field: Option<String>,
    /// Read and write cache artifacts next to source files.
    pub use_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from(DEFAULT_CHECKPOINT_DIR),
            id_field: None,
            use_cache: true,
        }
    }
}

impl Config {
    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = dir.into();
        self
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }
}
