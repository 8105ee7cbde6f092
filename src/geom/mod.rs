mod adjacency;
mod geom;
mod overlap;

pub(crate) use geom::Geometries;
pub(crate) use overlap::{areal, areal_with_area, representative_point};
