//! Disk memoization: cache artifacts next to source files, and named checkpoints.

mod checkpoint;
mod key;
mod loader;
mod store;

pub use checkpoint::CheckpointStore;
pub use key::{ArtifactKind, CacheKey};
pub use loader::{Artifact, Loader};
pub use store::Lookup;
