mod partition;

pub use partition::{GroupAssignment, PartAssignment, Partition};
