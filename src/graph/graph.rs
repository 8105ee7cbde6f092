use std::sync::Arc;

use polars::frame::DataFrame;

/// A weighted, undirected dual graph in compressed sparse row format.
/// Nodes are the rows of a layer; edge weights are shared boundary lengths.
#[derive(Debug, Clone)]
pub struct Graph {
    ids: Vec<Arc<str>>,
    offsets: Vec<u32>,
    edges: Vec<u32>,
    edge_weights: Vec<f64>,
    data: DataFrame, // Node attributes, one row per node
}

impl Graph {
    /// Construct a graph from adjacency lists, edge weights and node attributes.
    pub(crate) fn new(ids: Vec<Arc<str>>, edges: &[Vec<u32>], edge_weights: &[Vec<f64>], data: DataFrame) -> Self {
        let num_nodes = ids.len();
        assert!(edges.len() == num_nodes, "edges.len() must equal num_nodes");
        assert!(edge_weights.len() == num_nodes, "edge_weights.len() must equal num_nodes");
        edges.iter().zip(edge_weights.iter()).enumerate().for_each(|(i, (edges, weights))| {
            assert!(edges.len() == weights.len(), "edges[{i}].len() must equal edge_weights[{i}].len()");
        });

        Self {
            ids,
            offsets: std::iter::once(0u32).chain(
                edges.iter()
                    .map(|v| v.len() as u32)
                    .scan(0u32, |acc, len| {*acc += len; Some(*acc)})
            ).collect::<Vec<u32>>(),
            edges: edges.iter().flatten().copied().collect(),
            edge_weights: edge_weights.iter().flatten().copied().collect(),
            data,
        }
    }

    /// Get the number of nodes in the graph.
    #[inline] pub fn node_count(&self) -> usize { self.ids.len() }

    /// Get the number of directed edge entries (each undirected edge counts twice).
    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Get the node ids, in node order.
    #[inline] pub fn ids(&self) -> &[Arc<str>] { &self.ids }

    /// Get the node attribute table.
    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    /// Get the range of edges for a given node.
    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Get the degree (number of neighbors) of a given node.
    #[inline] pub fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Get an iterator over the neighbors of a given node.
    #[inline]
    pub fn edges(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.range(node).map(move |v| self.edges[v] as usize)
    }

    /// Get an iterator over the neighbors and edge weights of a given node.
    #[inline]
    pub fn edges_with_weights(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.range(node).map(move |v| (self.edges[v] as usize, self.edge_weights[v]))
    }

    /// Per-node neighbor lists and weights (the inverse of `new`).
    pub(crate) fn adjacency_lists(&self) -> (Vec<Vec<u32>>, Vec<Vec<f64>>) {
        (0..self.node_count())
            .map(|node| {
                let range = self.range(node);
                (self.edges[range.clone()].to_vec(), self.edge_weights[range].to_vec())
            })
            .unzip()
    }
}
