use std::{collections::BTreeMap, sync::Arc};

use polars::prelude::DataType;

use crate::{error::{Error, Result}, graph::Graph};

/// Node id -> part mapping, the persisted form of a partition.
pub type PartAssignment = BTreeMap<String, u32>;

/// Capability of values that carry an identifier-to-group assignment.
/// Checkpointing such a value persists only this assignment.
pub trait GroupAssignment {
    fn group_assignment(&self) -> PartAssignment;
}

/// A partition of a graph's nodes into numbered parts (districts).
#[derive(Clone, Debug)]
pub struct Partition {
    graph: Arc<Graph>,
    parts: Vec<u32>, // Part of each node, in node order
}

impl Partition {
    /// Construct a partition from a graph reference and one part number per node.
    pub fn new(graph: impl Into<Arc<Graph>>, parts: Vec<u32>) -> Result<Self> {
        let graph: Arc<Graph> = graph.into();
        if parts.len() != graph.node_count() {
            return Err(Error::InvalidLayer(format!(
                "partition has {} assignments but graph has {} nodes", parts.len(), graph.node_count()
            )));
        }
        Ok(Self { graph, parts })
    }

    /// Rebuild a partition from a persisted assignment; every node must be present.
    pub fn from_assignment(graph: impl Into<Arc<Graph>>, assignment: &PartAssignment) -> Result<Self> {
        let graph: Arc<Graph> = graph.into();
        let parts = graph.ids().iter()
            .map(|id| assignment.get(id.as_ref()).copied()
                .ok_or_else(|| Error::InvalidLayer(format!("assignment has no part for node {id:?}"))))
            .collect::<Result<Vec<_>>>()?;
        Self::new(graph, parts)
    }

    /// Read each node's part from a numeric node attribute.
    ///
    /// Float columns are accepted when every value is a whole number, since DBF
    /// numeric fields (`N(k,0)`) load as `Float64`. Values must fit in `u32`.
    pub fn from_attribute(graph: impl Into<Arc<Graph>>, attribute: &str) -> Result<Self> {
        let graph: Arc<Graph> = graph.into();
        let column = graph.data().column(attribute).map_err(|_| Error::MissingAttribute {
            attribute: attribute.to_string(),
            layer: "graph".to_string(),
        })?;
        let dtype = column.dtype();
        if !dtype.is_integer() && !dtype.is_float() {
            return Err(Error::NonNumericAttribute { attribute: attribute.to_string(), layer: "graph".to_string() });
        }

        let parts = column.cast(&DataType::Float64)?.f64()?.iter()
            .enumerate()
            .map(|(node, part)| part
                .filter(|&part| part.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&part))
                .map(|part| part as u32)
                .ok_or_else(|| Error::InvalidLayer(format!("node {node}: {attribute:?} is not a valid part number"))))
            .collect::<Result<Vec<_>>>()?;
        Self::new(graph, parts)
    }

    #[inline] pub fn graph(&self) -> &Graph { &self.graph }

    /// Get the part of a given node.
    #[inline] pub fn part(&self, node: usize) -> u32 { self.parts[node] }

    /// Number of distinct parts in use.
    pub fn num_parts(&self) -> usize {
        let mut parts = self.parts.clone();
        parts.sort_unstable();
        parts.dedup();
        parts.len()
    }
}

impl GroupAssignment for Partition {
    fn group_assignment(&self) -> PartAssignment {
        self.graph.ids().iter()
            .zip(&self.parts)
            .map(|(id, &part)| (id.to_string(), part))
            .collect()
    }
}
