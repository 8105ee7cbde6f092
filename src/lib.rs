#![doc = "Spatial assignment of census blocks to precincts, attribute aggregation, and disk-cached loaders."]
mod aggregate;
mod assign;
mod cache;
mod common;
mod config;
mod error;
mod geom;
mod graph;
mod io;
mod layer;
mod partition;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use config::{Config, DEFAULT_CHECKPOINT_DIR};

#[doc(inline)]
pub use layer::{Layer, ID_COLUMN};

#[doc(inline)]
pub use assign::{Assignment, assign};

#[doc(inline)]
pub use aggregate::{aggregate, assign_population_data};

#[doc(inline)]
pub use graph::Graph;

#[doc(inline)]
pub use partition::{GroupAssignment, PartAssignment, Partition};

#[doc(inline)]
pub use cache::{Artifact, ArtifactKind, CacheKey, CheckpointStore, Loader, Lookup};
