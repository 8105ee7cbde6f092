//! WKB writing operations.

use anyhow::{Context, Result};
use geo::{Coord, Geometry, LineString, Polygon};
use std::io::Write;

use super::{
    WKB_GEOMETRYCOLLECTION, WKB_LE, WKB_LINESTRING, WKB_MULTILINESTRING, WKB_MULTIPOINT,
    WKB_MULTIPOLYGON, WKB_POINT, WKB_POLYGON,
};

fn write_header(out: &mut Vec<u8>, geom_type: u32) -> Result<()> {
    out.write_all(&[WKB_LE])?;
    out.write_all(&geom_type.to_le_bytes())?;
    Ok(())
}

fn write_count(out: &mut Vec<u8>, count: usize) -> Result<()> {
    let count = u32::try_from(count).context("[io::wkb::write] Element count exceeds u32")?;
    out.write_all(&count.to_le_bytes())?;
    Ok(())
}

fn write_coord(out: &mut Vec<u8>, coord: Coord<f64>) -> Result<()> {
    out.write_all(&coord.x.to_le_bytes())?;
    out.write_all(&coord.y.to_le_bytes())?;
    Ok(())
}

fn write_ring(out: &mut Vec<u8>, ring: &LineString<f64>) -> Result<()> {
    write_count(out, ring.0.len())?;
    for &coord in &ring.0 {
        write_coord(out, coord)?;
    }
    Ok(())
}

fn write_polygon(out: &mut Vec<u8>, poly: &Polygon<f64>) -> Result<()> {
    write_header(out, WKB_POLYGON)?;
    write_count(out, 1 + poly.interiors().len())?;
    write_ring(out, poly.exterior())?;
    for interior in poly.interiors() {
        write_ring(out, interior)?;
    }
    Ok(())
}

fn write_line_string(out: &mut Vec<u8>, line: &LineString<f64>) -> Result<()> {
    write_header(out, WKB_LINESTRING)?;
    write_ring(out, line)
}

/// Append the little-endian WKB encoding of `geom` to `out`.
///
/// `Line`, `Rect` and `Triangle` have no WKB type of their own and are
/// written as the equivalent `LineString` or `Polygon`.
pub(crate) fn write_geometry(out: &mut Vec<u8>, geom: &Geometry<f64>) -> Result<()> {
    match geom {
        Geometry::Point(p) => {
            write_header(out, WKB_POINT)?;
            write_coord(out, p.0)
        }
        Geometry::Line(line) => write_line_string(out, &LineString::from(vec![line.start, line.end])),
        Geometry::LineString(line) => write_line_string(out, line),
        Geometry::Polygon(poly) => write_polygon(out, poly),
        Geometry::MultiPoint(mp) => {
            write_header(out, WKB_MULTIPOINT)?;
            write_count(out, mp.0.len())?;
            for p in &mp.0 {
                write_header(out, WKB_POINT)?;
                write_coord(out, p.0)?;
            }
            Ok(())
        }
        Geometry::MultiLineString(mls) => {
            write_header(out, WKB_MULTILINESTRING)?;
            write_count(out, mls.0.len())?;
            for line in &mls.0 {
                write_line_string(out, line)?;
            }
            Ok(())
        }
        Geometry::MultiPolygon(mp) => {
            write_header(out, WKB_MULTIPOLYGON)?;
            write_count(out, mp.0.len())?;
            for poly in &mp.0 {
                write_polygon(out, poly)?;
            }
            Ok(())
        }
        Geometry::GeometryCollection(gc) => {
            write_header(out, WKB_GEOMETRYCOLLECTION)?;
            write_count(out, gc.0.len())?;
            for g in &gc.0 {
                write_geometry(out, g)?;
            }
            Ok(())
        }
        Geometry::Rect(rect) => write_polygon(out, &rect.to_polygon()),
        Geometry::Triangle(tri) => write_polygon(out, &tri.to_polygon()),
    }
}

/// Write a sequence of geometries as `count` followed by length-prefixed WKB records.
pub(crate) fn write_geometries_to_wkb_bytes(shapes: &[Geometry<f64>]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_count(&mut out, shapes.len())
        .context("[io::wkb::write] Failed to write geometry count")?;

    let mut record = Vec::new();
    for (i, shape) in shapes.iter().enumerate() {
        record.clear();
        write_geometry(&mut record, shape)
            .with_context(|| format!("[io::wkb::write] Failed to encode geometry {i}"))?;
        write_count(&mut out, record.len())?;
        out.write_all(&record)
            .context("[io::wkb::write] Failed to write WKB bytes")?;
    }

    Ok(out)
}
