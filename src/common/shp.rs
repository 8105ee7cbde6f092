use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result, bail};
use polars::prelude::*;
use shapefile::{
    Reader,
    dbase::{FieldValue, Record},
};
use tracing::{debug, info};

use crate::{
    common::{epsg_from_shapefile, shape_to_geometry},
    layer::{ID_COLUMN, Layer},
};

/// Typed buffer for one DBF field.
enum FieldColumn {
    Str(Vec<Option<String>>),
    Float(Vec<Option<f64>>),
    Int(Vec<Option<i64>>),
    Bool(Vec<Option<bool>>),
}

impl FieldColumn {
    /// Pick the column type from a sample value; dates have no column.
    fn for_value(value: &FieldValue, capacity: usize) -> Option<Self> {
        match value {
            FieldValue::Character(_) | FieldValue::Memo(_) => Some(Self::Str(Vec::with_capacity(capacity))),
            FieldValue::Numeric(_) | FieldValue::Float(_) | FieldValue::Double(_) | FieldValue::Currency(_) => {
                Some(Self::Float(Vec::with_capacity(capacity)))
            }
            FieldValue::Integer(_) => Some(Self::Int(Vec::with_capacity(capacity))),
            FieldValue::Logical(_) => Some(Self::Bool(Vec::with_capacity(capacity))),
            _ => None,
        }
    }

    /// Append a value, storing null when it is absent or of another type.
    fn push(&mut self, value: Option<&FieldValue>) {
        match self {
            Self::Str(v) => v.push(match value {
                Some(FieldValue::Character(s)) => s.as_ref().map(|s| s.trim().to_string()),
                Some(FieldValue::Memo(s)) => Some(s.clone()),
                _ => None,
            }),
            Self::Float(v) => v.push(match value {
                Some(FieldValue::Numeric(n)) => *n,
                Some(FieldValue::Float(n)) => n.map(f64::from),
                Some(FieldValue::Double(n)) | Some(FieldValue::Currency(n)) => Some(*n),
                _ => None,
            }),
            Self::Int(v) => v.push(match value {
                Some(FieldValue::Integer(n)) => Some(i64::from(*n)),
                _ => None,
            }),
            Self::Bool(v) => v.push(match value {
                Some(FieldValue::Logical(b)) => *b,
                _ => None,
            }),
        }
    }

    fn into_column(self, name: &str) -> Column {
        match self {
            Self::Str(v) => Column::new(name.into(), v),
            Self::Float(v) => Column::new(name.into(), v),
            Self::Int(v) => Column::new(name.into(), v),
            Self::Bool(v) => Column::new(name.into(), v),
        }
    }
}

/// Render an identifier field value as text.
fn id_from_field(value: Option<&FieldValue>, field: &str, row: usize) -> Result<String> {
    match value {
        Some(FieldValue::Character(Some(s))) => Ok(s.trim().to_string()),
        Some(FieldValue::Memo(s)) => Ok(s.trim().to_string()),
        Some(FieldValue::Integer(n)) => Ok(n.to_string()),
        Some(FieldValue::Numeric(Some(n))) if n.fract() == 0.0 => Ok(format!("{}", *n as i64)),
        Some(FieldValue::Numeric(Some(n))) => Ok(n.to_string()),
        None => bail!("[common::shp] Missing id field {field:?}"),
        _ => bail!("[common::shp] Id field {field:?} has no usable value at row {row}"),
    }
}

/// Convert DBF records to an attribute table: `geo_id` first, then one column
/// per field in field-name order.
fn records_to_dataframe(records: Vec<Record>, id_field: Option<&str>) -> Result<DataFrame> {
    let height = records.len();
    let records = records.into_iter()
        .map(|record| record.into_iter().collect::<BTreeMap<String, FieldValue>>())
        .collect::<Vec<_>>();

    let ids = match id_field {
        Some(field) => records.iter().enumerate()
            .map(|(row, record)| id_from_field(record.get(field), field, row))
            .collect::<Result<Vec<_>>>()?,
        None => (0..height).map(|row| row.to_string()).collect(),
    };

    let mut fields = Vec::new();
    if let Some(first) = records.first() {
        for (name, value) in first {
            if name == ID_COLUMN {
                debug!(field = name.as_str(), "skipping DBF field that shadows the id column");
                continue;
            }
            match FieldColumn::for_value(value, height) {
                Some(column) => fields.push((name.clone(), column)),
                None => debug!(field = name.as_str(), "skipping date field"),
            }
        }
    }

    for record in &records {
        for (name, column) in &mut fields {
            column.push(record.get(name.as_str()));
        }
    }

    let mut columns = Vec::with_capacity(fields.len() + 1);
    columns.push(Column::new(ID_COLUMN.into(), ids));
    columns.extend(fields.into_iter().map(|(name, column)| column.into_column(&name)));

    Ok(DataFrame::new(columns)?)
}

/// Read a shapefile and its attributes into a layer named after the file stem.
pub(crate) fn read_layer_from_shapefile(path: &Path, id_field: Option<&str>) -> Result<Layer> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[common::shp] Failed to open shapefile: {}", path.display()))?;

    let mut shapes = Vec::new();
    let mut records = Vec::new();
    for (row, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result
            .with_context(|| format!("[common::shp] Error reading shape+record {row}"))?;
        shapes.push(shape_to_geometry(shape)
            .with_context(|| format!("[common::shp] Error converting shape {row} in {}", path.display()))?);
        records.push(record);
    }

    let data = records_to_dataframe(records, id_field)?;
    let name = path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let layer = Layer::from_dataframe(&name, data, shapes, epsg_from_shapefile(path))?;
    info!(path = %path.display(), rows = layer.len(), epsg = ?layer.epsg(), "read shapefile");
    Ok(layer)
}
