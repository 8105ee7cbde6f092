//! Well-Known Binary encoding for layer geometries.

mod read;
mod write;

pub(crate) use read::read_geometries_from_wkb_bytes;
pub(crate) use write::write_geometries_to_wkb_bytes;

const WKB_POINT: u32 = 1;
const WKB_LINESTRING: u32 = 2;
const WKB_POLYGON: u32 = 3;
const WKB_MULTIPOINT: u32 = 4;
const WKB_MULTILINESTRING: u32 = 5;
const WKB_MULTIPOLYGON: u32 = 6;
const WKB_GEOMETRYCOLLECTION: u32 = 7;

/// WKB byte order: little endian
const WKB_LE: u8 = 1;
