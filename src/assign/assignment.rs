use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{error::{Error, Result}, layer::Layer};

/// Source row -> target row mapping, one slot per source row (`None` = unassigned).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    targets: Vec<Option<u32>>,
}

impl Assignment {
    pub(crate) fn new(targets: Vec<Option<u32>>) -> Self {
        Self { targets }
    }

    /// Number of source rows covered by the mapping.
    #[inline] pub fn len(&self) -> usize { self.targets.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.targets.is_empty() }

    /// Target row assigned to a given source row.
    #[inline]
    pub fn get(&self, source_row: usize) -> Option<usize> {
        self.targets.get(source_row).copied().flatten().map(|t| t as usize)
    }

    /// Per-source-row target slots.
    #[inline] pub fn as_slice(&self) -> &[Option<u32>] { &self.targets }

    /// Number of source rows with no target.
    pub fn num_unassigned(&self) -> usize {
        self.targets.iter().filter(|t| t.is_none()).count()
    }

    /// Check that this mapping was computed for the given pair of layers.
    pub(crate) fn validate(&self, source: &Layer, target: &Layer) -> Result<()> {
        if self.len() != source.len() {
            return Err(Error::GeometryMismatch(format!(
                "assignment covers {} rows but layer {:?} has {}", self.len(), source.name(), source.len()
            )));
        }
        if let Some(t) = self.targets.iter().flatten().find(|&&t| t as usize >= target.len()) {
            return Err(Error::GeometryMismatch(format!(
                "assignment refers to row {t} but layer {:?} has {} rows", target.name(), target.len()
            )));
        }
        Ok(())
    }

    /// Render the mapping as `source id -> target id` (`None` = unassigned).
    pub fn to_id_map(&self, source: &Layer, target: &Layer) -> Result<BTreeMap<String, Option<String>>> {
        self.validate(source, target)?;
        Ok(self.targets.iter().enumerate()
            .map(|(i, t)| (source.id(i).to_string(), t.map(|t| target.id(t as usize).to_string())))
            .collect())
    }
}
