mod io;
mod layer;

pub use layer::{Layer, ID_COLUMN};
