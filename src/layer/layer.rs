use std::sync::Arc;

use ahash::AHashMap;
use geo::{Geometry, Rect};
use polars::prelude::*;

use crate::{error::{Error, Result}, geom::Geometries};

/// Name of the identifier column every layer's table starts with.
pub const ID_COLUMN: &str = "geo_id";

/// A collection of geometric records: unique ids, one geometry per row, and an attribute table.
#[derive(Debug, Clone)]
pub struct Layer {
    name: Arc<str>,                   // Used to name the layer in errors and logs
    ids: Vec<Arc<str>>,
    index: AHashMap<Arc<str>, u32>,   // Map between ids and row indices
    geoms: Geometries,
    data: DataFrame,                  // Attribute table, first column is `geo_id`
}

impl Layer {
    /// Construct a layer from ids and shapes, with an attribute table holding only the ids.
    pub fn new(name: &str, ids: Vec<String>, shapes: Vec<Geometry<f64>>, epsg: Option<u32>) -> Result<Self> {
        let data = DataFrame::new(vec![Column::new(ID_COLUMN.into(), &ids)])?;
        Self::from_dataframe(name, data, shapes, epsg)
    }

    /// Construct a layer from an attribute table whose `geo_id` column holds the ids.
    pub fn from_dataframe(name: &str, data: DataFrame, shapes: Vec<Geometry<f64>>, epsg: Option<u32>) -> Result<Self> {
        let ids = data.column(ID_COLUMN)
            .map_err(|_| Error::InvalidLayer(format!("layer {name:?} has no {ID_COLUMN:?} column")))?
            .str()
            .map_err(|_| Error::InvalidLayer(format!("layer {name:?}: {ID_COLUMN:?} must be of type String")))?
            .iter()
            .enumerate()
            .map(|(i, id)| id
                .map(Arc::<str>::from)
                .ok_or_else(|| Error::InvalidLayer(format!("layer {name:?}: missing id at row {i}"))))
            .collect::<Result<Vec<_>>>()?;

        if ids.len() != shapes.len() {
            return Err(Error::InvalidLayer(format!(
                "layer {name:?}: {} ids but {} geometries", ids.len(), shapes.len()
            )));
        }

        let mut index = AHashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), i as u32).is_some() {
                return Err(Error::InvalidLayer(format!("layer {name:?}: duplicate id {id:?}")));
            }
        }

        Ok(Self {
            name: name.into(),
            ids,
            index,
            geoms: Geometries::new(shapes, epsg),
            data,
        })
    }

    /// Builder-style variant of `set_column`.
    pub fn with_column(mut self, column: impl Into<Column>) -> Result<Self> {
        self.set_column(column.into())?;
        Ok(self)
    }

    /// Add an attribute column, replacing any existing column with the same name.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if column.name().as_str() == ID_COLUMN {
            return Err(Error::InvalidLayer(format!("layer {:?}: {ID_COLUMN:?} is reserved", self.name)));
        }
        if column.len() != self.len() {
            return Err(Error::InvalidLayer(format!(
                "layer {:?}: column {:?} has {} rows, expected {}",
                self.name, column.name().as_str(), column.len(), self.len()
            )));
        }
        self.data.with_column(column)?;
        Ok(())
    }

    /// Get the layer name.
    #[inline] pub fn name(&self) -> &str { &self.name }

    /// Get the number of rows.
    #[inline] pub fn len(&self) -> usize { self.ids.len() }

    /// Check if the layer has no rows.
    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Get the row ids, in row order.
    #[inline] pub fn ids(&self) -> &[Arc<str>] { &self.ids }

    /// Get the id of a given row.
    #[inline] pub fn id(&self, row: usize) -> &str { &self.ids[row] }

    /// Find the row of a given id.
    #[inline] pub fn row_of(&self, id: &str) -> Option<usize> { self.index.get(id).map(|&i| i as usize) }

    /// Get the EPSG code of the layer's coordinate system, if known.
    #[inline] pub fn epsg(&self) -> Option<u32> { self.geoms.epsg() }

    /// Get the per-row geometries.
    #[inline] pub fn shapes(&self) -> &[Geometry<f64>] { self.geoms.shapes() }

    /// Get the attribute table.
    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    /// Get an attribute column by name.
    #[inline] pub fn column(&self, name: &str) -> Option<&Column> { self.data.column(name).ok() }

    /// Bounding rectangle of all geometries, if any are non-empty.
    #[inline] pub fn bounds(&self) -> Option<Rect<f64>> { self.geoms.bounds() }

    #[inline] pub(crate) fn geoms(&self) -> &Geometries { &self.geoms }
}
