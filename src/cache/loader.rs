use std::path::Path;

use tracing::{debug, info};

use crate::{
    cache::{ArtifactKind, CacheKey, Lookup, store},
    common,
    config::Config,
    error::{Error, Result},
    graph::Graph,
    io::artifact,
    layer::Layer,
};

/// A value that can be loaded from a primary source and memoized as a cache artifact.
pub trait Artifact: Sized {
    const KIND: ArtifactKind;

    /// Build the value from the primary source at `path`.
    fn from_source(path: &Path, config: &Config) -> anyhow::Result<Self>;

    /// Encode the value, recording the id field it was read with.
    fn encode(&self, id_field: Option<&str>) -> anyhow::Result<Vec<u8>>;

    /// Decode an artifact; one recorded with a different id field is an error.
    fn decode(bytes: &[u8], id_field: Option<&str>) -> anyhow::Result<Self>;
}

impl Artifact for Layer {
    const KIND: ArtifactKind = ArtifactKind::Layer;

    fn from_source(path: &Path, config: &Config) -> anyhow::Result<Self> {
        common::read_layer_from_shapefile(path, config.id_field.as_deref())
    }

    fn encode(&self, id_field: Option<&str>) -> anyhow::Result<Vec<u8>> { artifact::encode_layer(self, id_field) }

    fn decode(bytes: &[u8], id_field: Option<&str>) -> anyhow::Result<Self> { artifact::decode_layer(bytes, id_field) }
}

impl Artifact for Graph {
    const KIND: ArtifactKind = ArtifactKind::Graph;

    fn from_source(path: &Path, config: &Config) -> anyhow::Result<Self> {
        let layer = common::read_layer_from_shapefile(path, config.id_field.as_deref())?;
        Graph::from_layer(&layer)
    }

    fn encode(&self, id_field: Option<&str>) -> anyhow::Result<Vec<u8>> { artifact::encode_graph(self, id_field) }

    fn decode(bytes: &[u8], id_field: Option<&str>) -> anyhow::Result<Self> { artifact::decode_graph(bytes, id_field) }
}

/// Loads layers and graphs from shapefiles, memoizing each next to its source.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    config: Config,
}

impl Loader {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[inline] pub fn config(&self) -> &Config { &self.config }

    /// Look up the cache artifact for `path` without touching the source.
    pub fn lookup<T: Artifact>(&self, path: impl AsRef<Path>) -> Lookup<T> {
        let key = CacheKey::new(path.as_ref(), T::KIND);
        let id_field = self.config.id_field.as_deref();
        store::read_artifact(key.path(), |bytes| T::decode(bytes, id_field))
    }

    /// Return the cached value for `path` if one decodes, otherwise read the source
    /// and persist a fresh artifact.
    pub fn load<T: Artifact>(&self, path: impl AsRef<Path>) -> Result<T> {
        let path = path.as_ref();
        let key = CacheKey::new(path, T::KIND);
        let id_field = self.config.id_field.as_deref();

        if self.config.use_cache {
            if let Lookup::Hit(value) = store::read_artifact(key.path(), |bytes| T::decode(bytes, id_field)) {
                return Ok(value);
            }
        } else {
            debug!(path = %path.display(), "cache disabled");
        }

        if !path.exists() {
            return Err(Error::SourceNotFound { path: path.to_path_buf() });
        }

        let value = T::from_source(path, &self.config)
            .map_err(|source| Error::Source { path: path.to_path_buf(), source })?;
        info!(path = %path.display(), kind = ?T::KIND, "loaded from source");

        if self.config.use_cache {
            store::write_artifact(key.path(), || value.encode(id_field));
        }
        Ok(value)
    }

    pub fn load_layer(&self, path: impl AsRef<Path>) -> Result<Layer> {
        self.load(path)
    }

    pub fn load_graph(&self, path: impl AsRef<Path>) -> Result<Graph> {
        self.load(path)
    }
}
