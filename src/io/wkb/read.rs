//! WKB reading operations.

use anyhow::{Context, Result, bail, ensure};
use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use std::io::{Cursor, Read};

use super::{
    WKB_GEOMETRYCOLLECTION, WKB_LE, WKB_LINESTRING, WKB_MULTILINESTRING, WKB_MULTIPOINT,
    WKB_MULTIPOLYGON, WKB_POINT, WKB_POLYGON,
};

/// Nested collections deeper than this are rejected rather than recursed into.
const MAX_DEPTH: usize = 32;

struct WkbReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> WkbReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { cursor: Cursor::new(bytes) }
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.cursor.read_exact(&mut b)?;
        Ok(b[0])
    }

    fn read_u32(&mut self, is_le: bool) -> Result<u32> {
        let mut b = [0u8; 4];
        self.cursor.read_exact(&mut b)?;
        Ok(if is_le { u32::from_le_bytes(b) } else { u32::from_be_bytes(b) })
    }

    fn read_f64(&mut self, is_le: bool) -> Result<f64> {
        let mut b = [0u8; 8];
        self.cursor.read_exact(&mut b)?;
        Ok(if is_le { f64::from_le_bytes(b) } else { f64::from_be_bytes(b) })
    }

    /// Read a count and check that at least `count * min_size` bytes remain.
    fn read_count(&mut self, is_le: bool, min_size: usize) -> Result<usize> {
        let count = self.read_u32(is_le)? as usize;
        let remaining = self.cursor.get_ref().len() as u64 - self.cursor.position();
        ensure!(
            (count as u64).saturating_mul(min_size as u64) <= remaining,
            "[io::wkb::read] Count {count} exceeds remaining input"
        );
        Ok(count)
    }

    fn read_coord(&mut self, is_le: bool) -> Result<Coord<f64>> {
        let x = self.read_f64(is_le).context("[io::wkb::read] Failed to read x coordinate")?;
        let y = self.read_f64(is_le).context("[io::wkb::read] Failed to read y coordinate")?;
        Ok(Coord { x, y })
    }

    fn read_ring(&mut self, is_le: bool) -> Result<LineString<f64>> {
        let len = self.read_count(is_le, 16).context("[io::wkb::read] Failed to read ring length")?;
        let coords = (0..len).map(|_| self.read_coord(is_le)).collect::<Result<Vec<_>>>()?;
        Ok(LineString::from(coords))
    }

    fn read_polygon_body(&mut self, is_le: bool) -> Result<Polygon<f64>> {
        let num_rings = self.read_count(is_le, 4).context("[io::wkb::read] Failed to read number of rings")?;
        if num_rings == 0 {
            return Ok(Polygon::new(LineString::new(vec![]), vec![]));
        }
        let exterior = self.read_ring(is_le)?;
        let interiors = (1..num_rings).map(|_| self.read_ring(is_le)).collect::<Result<Vec<_>>>()?;
        Ok(Polygon::new(exterior, interiors))
    }

    fn read_header(&mut self) -> Result<(bool, u32)> {
        let byte_order = self.read_u8().context("[io::wkb::read] Failed to read byte order")?;
        ensure!(byte_order <= 1, "[io::wkb::read] Invalid byte order marker {byte_order}");
        let is_le = byte_order == WKB_LE;
        let geom_type = self.read_u32(is_le).context("[io::wkb::read] Failed to read geometry type")?;
        Ok((is_le, geom_type))
    }

    /// Read a nested member that must be of `expected` type.
    fn read_member(&mut self, expected: u32, depth: usize) -> Result<Geometry<f64>> {
        let start = self.cursor.position();
        let (_, geom_type) = self.read_header()?;
        ensure!(geom_type == expected, "[io::wkb::read] Expected member type {expected}, got {geom_type}");
        self.cursor.set_position(start);
        self.read_geometry(depth + 1)
    }

    fn read_geometry(&mut self, depth: usize) -> Result<Geometry<f64>> {
        ensure!(depth <= MAX_DEPTH, "[io::wkb::read] Geometry nesting exceeds {MAX_DEPTH} levels");
        let (is_le, geom_type) = self.read_header()?;

        let geom = match geom_type {
            WKB_POINT => Geometry::Point(Point(self.read_coord(is_le)?)),
            WKB_LINESTRING => Geometry::LineString(self.read_ring(is_le)?),
            WKB_POLYGON => Geometry::Polygon(self.read_polygon_body(is_le)?),
            WKB_MULTIPOINT => {
                let n = self.read_count(is_le, 21)?;
                let mut points = Vec::with_capacity(n);
                for _ in 0..n {
                    if let Geometry::Point(p) = self.read_member(WKB_POINT, depth)? {
                        points.push(p);
                    }
                }
                Geometry::MultiPoint(MultiPoint(points))
            }
            WKB_MULTILINESTRING => {
                let n = self.read_count(is_le, 9)?;
                let mut lines = Vec::with_capacity(n);
                for _ in 0..n {
                    if let Geometry::LineString(l) = self.read_member(WKB_LINESTRING, depth)? {
                        lines.push(l);
                    }
                }
                Geometry::MultiLineString(MultiLineString(lines))
            }
            WKB_MULTIPOLYGON => {
                let n = self.read_count(is_le, 9)?;
                let mut polys = Vec::with_capacity(n);
                for _ in 0..n {
                    if let Geometry::Polygon(p) = self.read_member(WKB_POLYGON, depth)? {
                        polys.push(p);
                    }
                }
                Geometry::MultiPolygon(MultiPolygon(polys))
            }
            WKB_GEOMETRYCOLLECTION => {
                let n = self.read_count(is_le, 5)?;
                let members = (0..n).map(|_| self.read_geometry(depth + 1)).collect::<Result<Vec<_>>>()?;
                Geometry::GeometryCollection(GeometryCollection(members))
            }
            other => bail!("[io::wkb::read] Unsupported WKB geometry type {other}"),
        };

        Ok(geom)
    }
}

/// Parse a single WKB geometry (either byte order).
pub(crate) fn read_geometry(bytes: &[u8]) -> Result<Geometry<f64>> {
    let mut reader = WkbReader::new(bytes);
    let geom = reader.read_geometry(0)?;
    ensure!(
        reader.cursor.position() as usize == bytes.len(),
        "[io::wkb::read] Trailing bytes after geometry"
    );
    Ok(geom)
}

/// Read geometries written by [`super::write_geometries_to_wkb_bytes`].
pub(crate) fn read_geometries_from_wkb_bytes(bytes: &[u8]) -> Result<Vec<Geometry<f64>>> {
    let mut cursor = Cursor::new(bytes);

    let mut b4 = [0u8; 4];
    cursor.read_exact(&mut b4)
        .context("[io::wkb::read] Failed to read geometry count")?;
    let count = u32::from_le_bytes(b4) as usize;
    ensure!(
        count.saturating_mul(4) <= bytes.len(),
        "[io::wkb::read] Geometry count {count} exceeds input size"
    );

    let mut shapes = Vec::with_capacity(count);
    for i in 0..count {
        cursor.read_exact(&mut b4)
            .context("[io::wkb::read] Failed to read WKB length")?;
        let len = u32::from_le_bytes(b4) as usize;

        let start = cursor.position() as usize;
        let end = start.checked_add(len)
            .filter(|&end| end <= bytes.len())
            .with_context(|| format!("[io::wkb::read] WKB record {i} runs past end of input"))?;

        let shape = read_geometry(&bytes[start..end])
            .with_context(|| format!("[io::wkb::read] Failed to parse WKB record {i}"))?;
        shapes.push(shape);
        cursor.set_position(end as u64);
    }

    ensure!(cursor.position() as usize == bytes.len(), "[io::wkb::read] Trailing bytes after geometries");
    Ok(shapes)
}
