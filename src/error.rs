use std::path::PathBuf;

/// Errors raised by assignment, aggregation and the cache-backed collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two layers cannot be compared: different CRS, disjoint extents,
    /// or an assignment that does not fit the layers it is applied to.
    #[error("geometry mismatch: {0}")]
    GeometryMismatch(String),

    #[error("layer {layer:?} has no rows")]
    EmptyInput { layer: String },

    #[error("attribute {attribute:?} not found on layer {layer:?}")]
    MissingAttribute { attribute: String, layer: String },

    #[error("attribute {attribute:?} on layer {layer:?} is not numeric")]
    NonNumericAttribute { attribute: String, layer: String },

    #[error("invalid layer: {0}")]
    InvalidLayer(String),

    #[error("source not found and no usable cache artifact: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("failed to read source {}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid checkpoint name: {0:?}")]
    InvalidCheckpointName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
