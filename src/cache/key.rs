use std::{ffi::OsString, path::{Path, PathBuf}};

/// The kind of value cached for a source path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The raw layer read from the source.
    Layer,
    /// The dual graph built over the source's layer.
    Graph,
}

impl ArtifactKind {
    /// Suffix appended to the source path to locate the artifact.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Layer => ".cache",
            Self::Graph => ".graph.cache",
        }
    }
}

/// Location of the cache artifact for a `(source path, kind)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path: PathBuf,
    kind: ArtifactKind,
}

impl CacheKey {
    pub fn new(source: &Path, kind: ArtifactKind) -> Self {
        let mut path = OsString::from(source.as_os_str());
        path.push(kind.suffix());
        Self { path: PathBuf::from(path), kind }
    }

    #[inline] pub fn path(&self) -> &Path { &self.path }

    #[inline] pub fn kind(&self) -> ArtifactKind { self.kind }
}
