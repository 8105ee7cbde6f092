use anyhow::Result;
use tracing::debug;

use crate::{graph::Graph, layer::Layer};

impl Graph {
    /// Build the rook dual graph of a layer: one node per row, an edge wherever two
    /// areal rows share a boundary segment, weighted by the shared length.
    pub fn from_layer(layer: &Layer) -> Result<Self> {
        let (edges, weights) = layer.geoms().rook_adjacencies()?;
        let graph = Self::new(layer.ids().to_vec(), &edges, &weights, layer.data().clone());
        debug!(layer = layer.name(), nodes = graph.node_count(), edges = graph.edge_count() / 2, "built dual graph");
        Ok(graph)
    }
}
