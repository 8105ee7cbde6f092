mod build;
mod graph;

pub use graph::Graph;
