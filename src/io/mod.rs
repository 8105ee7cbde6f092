//! Format-specific encoders used by the cache artifacts and command-line output.
//!
//! - `wkb` - Well-Known Binary for layer geometries
//! - `csr` - Compressed Sparse Row for weighted adjacency
//! - `json` - JSON lines for attribute tables
//! - `csv` - CSV for tabular output
//! - `artifact` - the gzip container holding a whole layer or graph

pub(crate) mod artifact;
pub(crate) mod csr;
pub(crate) mod csv;
pub(crate) mod json;
pub(crate) mod wkb;
