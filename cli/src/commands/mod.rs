pub mod assign;
pub mod graph;
