//! JSON-lines encoding for attribute tables.

use std::io::Cursor;

use anyhow::{Context, Result, bail, ensure};
use polars::{
    frame::DataFrame,
    io::{SerReader, SerWriter},
    prelude::{DataType, Field, JsonFormat, JsonReader, JsonWriter, Schema},
};

/// Write DataFrame to JSON-lines bytes.
///
/// A frame with no rows encodes as empty bytes; its schema is not kept.
pub(crate) fn write_to_json_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    if df.height() == 0 {
        return Ok(out);
    }
    JsonWriter::new(&mut out)
        .with_json_format(JsonFormat::JsonLines)
        .finish(&mut df.clone())
        .context("[io::json] Failed to write JSON lines")?;
    Ok(out)
}

/// Stable tag for the column types a table schema can restore.
fn dtype_tag(dtype: &DataType) -> Option<&'static str> {
    Some(match dtype {
        DataType::Boolean => "bool",
        DataType::Int8 => "i8",
        DataType::Int16 => "i16",
        DataType::Int32 => "i32",
        DataType::Int64 => "i64",
        DataType::UInt8 => "u8",
        DataType::UInt16 => "u16",
        DataType::UInt32 => "u32",
        DataType::UInt64 => "u64",
        DataType::Float32 => "f32",
        DataType::Float64 => "f64",
        DataType::String => "str",
        _ => return None,
    })
}

fn dtype_from_tag(tag: &str) -> Option<DataType> {
    Some(match tag {
        "bool" => DataType::Boolean,
        "i8" => DataType::Int8,
        "i16" => DataType::Int16,
        "i32" => DataType::Int32,
        "i64" => DataType::Int64,
        "u8" => DataType::UInt8,
        "u16" => DataType::UInt16,
        "u32" => DataType::UInt32,
        "u64" => DataType::UInt64,
        "f32" => DataType::Float32,
        "f64" => DataType::Float64,
        "str" => DataType::String,
        _ => return None,
    })
}

/// Write the column names and types of a DataFrame as a JSON array of
/// `[name, tag]` pairs. Types without a tag are stored as `null` and left to inference.
pub(crate) fn write_schema_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let schema = df.get_columns().iter()
        .map(|col| (col.name().as_str(), dtype_tag(col.dtype())))
        .collect::<Vec<_>>();
    serde_json::to_vec(&schema).context("[io::json] Failed to write table schema")
}

/// Read a schema written by [`write_schema_bytes`].
pub(crate) fn read_schema_bytes(bytes: &[u8]) -> Result<Vec<(String, Option<DataType>)>> {
    let schema = serde_json::from_slice::<Vec<(String, Option<String>)>>(bytes)
        .context("[io::json] Failed to parse table schema")?;
    schema.into_iter()
        .map(|(name, tag)| match tag {
            None => Ok((name, None)),
            Some(tag) => match dtype_from_tag(&tag) {
                Some(dtype) => Ok((name, Some(dtype))),
                None => bail!("[io::json] Unknown column type {tag:?} for {name:?}"),
            },
        })
        .collect()
}

/// Read DataFrame from JSON-lines bytes, restoring the column types in `schema`.
///
/// Inference alone loses types (an all-null column reads as `Null`, a numeric-looking
/// id as a number), so every typed column is cast back to its stored type. Untyped
/// all-null columns become `String`.
pub(crate) fn read_from_json_bytes(bytes: &[u8], schema: &[(String, Option<DataType>)]) -> Result<DataFrame> {
    if bytes.is_empty() {
        return Ok(DataFrame::empty());
    }

    let overwrite = Schema::from_iter(schema.iter()
        .filter(|(_, dtype)| dtype.as_ref() == Some(&DataType::String))
        .map(|(name, _)| Field::new(name.as_str().into(), DataType::String)));

    let mut df = JsonReader::new(Cursor::new(bytes))
        .with_json_format(JsonFormat::JsonLines)
        .with_schema_overwrite(&overwrite)
        .finish()
        .context("[io::json] Failed to read JSON lines")?;

    let names = df.get_column_names().iter().map(|name| name.as_str()).collect::<Vec<_>>();
    ensure!(
        names.len() == schema.len() && names.iter().zip(schema).all(|(a, (b, _))| *a == b.as_str()),
        "[io::json] Columns {names:?} do not match the stored schema"
    );

    for (name, dtype) in schema {
        let column = df.column(name)?;
        let target = match dtype {
            Some(dtype) => dtype.clone(),
            None if column.dtype() == &DataType::Null => DataType::String,
            None => continue,
        };
        if column.dtype() != &target {
            let cast = column.cast(&target)
                .with_context(|| format!("[io::json] Failed to restore column {name:?} as {target}"))?;
            df.with_column(cast)?;
        }
    }

    Ok(df)
}
