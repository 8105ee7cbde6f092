//! Binary container for cached layers and graphs.
//!
//! Layout: magic `BWCA`, a version byte, a kind byte, then a gzip stream of
//! length-prefixed sections (`u64` little-endian length followed by the bytes).
//! The first section records the id field the value was read with.

use std::{io::{Cursor, Read, Write}, sync::Arc};

use anyhow::{Context, Result, bail, ensure};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};

use crate::{
    graph::Graph,
    io::{csr, json, wkb},
    layer::Layer,
};

/// Magic bytes for cache artifacts: "BWCA" (BlockWalk Cache Artifact)
const MAGIC: &[u8; 4] = b"BWCA";
/// Format version, bumped whenever the section layout changes
const VERSION: u8 = 2;

const KIND_LAYER: u8 = 0;
const KIND_GRAPH: u8 = 1;

fn write_section(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    out.write_all(&(bytes.len() as u64).to_le_bytes())?;
    out.write_all(bytes)?;
    Ok(())
}

fn finish(kind: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(payload.len() / 4 + 6);
    out.write_all(MAGIC)?;
    out.write_all(&[VERSION, kind])?;

    let mut encoder = GzEncoder::new(out, Compression::default());
    encoder.write_all(payload)
        .context("[io::artifact] Failed to compress payload")?;
    encoder.finish().context("[io::artifact] Failed to finish compression")
}

/// Check the header and return the decompressed payload.
fn open(bytes: &[u8], kind: u8) -> Result<Vec<u8>> {
    ensure!(bytes.len() >= 6, "[io::artifact] Artifact too short ({} bytes)", bytes.len());
    ensure!(&bytes[..4] == MAGIC, "[io::artifact] Invalid artifact: bad magic bytes");
    ensure!(bytes[4] == VERSION, "[io::artifact] Unsupported artifact version: {}", bytes[4]);
    ensure!(bytes[5] == kind, "[io::artifact] Artifact kind {} does not match expected {}", bytes[5], kind);

    let mut payload = Vec::new();
    GzDecoder::new(&bytes[6..]).read_to_end(&mut payload)
        .context("[io::artifact] Failed to decompress payload")?;
    Ok(payload)
}

struct Sections<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Sections<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self { cursor: Cursor::new(payload) }
    }

    fn next(&mut self, what: &str) -> Result<&'a [u8]> {
        let mut b8 = [0u8; 8];
        self.cursor.read_exact(&mut b8)
            .with_context(|| format!("[io::artifact] Missing {what} section"))?;
        let len = u64::from_le_bytes(b8);

        let buf = *self.cursor.get_ref();
        let start = self.cursor.position() as usize;
        let end = usize::try_from(len).ok()
            .and_then(|len| start.checked_add(len))
            .filter(|&end| end <= buf.len())
            .with_context(|| format!("[io::artifact] Truncated {what} section"))?;
        self.cursor.set_position(end as u64);
        Ok(&buf[start..end])
    }

    fn done(&self) -> Result<()> {
        ensure!(
            self.cursor.position() as usize == self.cursor.get_ref().len(),
            "[io::artifact] Trailing bytes after last section"
        );
        Ok(())
    }
}

fn encode_epsg(epsg: Option<u32>) -> Vec<u8> {
    epsg.map(|code| code.to_le_bytes().to_vec()).unwrap_or_default()
}

fn decode_epsg(bytes: &[u8]) -> Result<Option<u32>> {
    match bytes.len() {
        0 => Ok(None),
        4 => Ok(Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))),
        n => bail!("[io::artifact] Invalid EPSG section length {n}"),
    }
}

/// The id field is stored as JSON (`null` when ids are row indices).
fn encode_id_field(out: &mut Vec<u8>, id_field: Option<&str>) -> Result<()> {
    write_section(out, &serde_json::to_vec(&id_field)?)
}

/// An artifact built with one id field must not be served to a load with another.
fn check_id_field(bytes: &[u8], id_field: Option<&str>) -> Result<()> {
    let stored = serde_json::from_slice::<Option<String>>(bytes)
        .context("[io::artifact] Failed to parse id field")?;
    ensure!(
        stored.as_deref() == id_field,
        "[io::artifact] Artifact was built with id field {stored:?}, requested {id_field:?}"
    );
    Ok(())
}

/// Encode a layer: id field, name, EPSG code, attribute schema and table, geometries.
pub(crate) fn encode_layer(layer: &Layer, id_field: Option<&str>) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    encode_id_field(&mut payload, id_field)?;
    write_section(&mut payload, layer.name().as_bytes())?;
    write_section(&mut payload, &encode_epsg(layer.epsg()))?;
    write_section(&mut payload, &json::write_schema_bytes(layer.data())?)?;
    write_section(&mut payload, &json::write_to_json_bytes(layer.data())?)?;
    write_section(&mut payload, &wkb::write_geometries_to_wkb_bytes(layer.shapes())?)?;
    finish(KIND_LAYER, &payload)
}

pub(crate) fn decode_layer(bytes: &[u8], id_field: Option<&str>) -> Result<Layer> {
    let payload = open(bytes, KIND_LAYER)?;
    let mut sections = Sections::new(&payload);
    check_id_field(sections.next("id field")?, id_field)?;

    let name = std::str::from_utf8(sections.next("name")?)
        .context("[io::artifact] Layer name is not valid UTF-8")?
        .to_string();
    let epsg = decode_epsg(sections.next("epsg")?)?;
    let schema = json::read_schema_bytes(sections.next("schema")?)?;
    let data = json::read_from_json_bytes(sections.next("data")?, &schema)?;
    let shapes = wkb::read_geometries_from_wkb_bytes(sections.next("geometry")?)?;
    sections.done()?;

    let layer = if data.width() == 0 {
        Layer::new(&name, Vec::new(), shapes, epsg)?
    } else {
        Layer::from_dataframe(&name, data, shapes, epsg)?
    };
    Ok(layer)
}

/// Encode a graph: id field, node ids, node attribute schema and table, weighted adjacency.
pub(crate) fn encode_graph(graph: &Graph, id_field: Option<&str>) -> Result<Vec<u8>> {
    let ids = graph.ids().iter().map(|id| id.as_ref()).collect::<Vec<&str>>();
    let (adjacencies, weights) = graph.adjacency_lists();

    let mut payload = Vec::new();
    encode_id_field(&mut payload, id_field)?;
    write_section(&mut payload, &serde_json::to_vec(&ids)?)?;
    write_section(&mut payload, &json::write_schema_bytes(graph.data())?)?;
    write_section(&mut payload, &json::write_to_json_bytes(graph.data())?)?;
    write_section(&mut payload, &csr::write_weighted_csr_bytes(&adjacencies, &weights)?)?;
    finish(KIND_GRAPH, &payload)
}

pub(crate) fn decode_graph(bytes: &[u8], id_field: Option<&str>) -> Result<Graph> {
    let payload = open(bytes, KIND_GRAPH)?;
    let mut sections = Sections::new(&payload);
    check_id_field(sections.next("id field")?, id_field)?;

    let ids = serde_json::from_slice::<Vec<String>>(sections.next("ids")?)
        .context("[io::artifact] Failed to parse node ids")?;
    let schema = json::read_schema_bytes(sections.next("schema")?)?;
    let data = json::read_from_json_bytes(sections.next("data")?, &schema)?;
    let (adjacencies, weights) = csr::read_weighted_csr_bytes(sections.next("adjacency")?)?;
    sections.done()?;

    ensure!(
        adjacencies.len() == ids.len(),
        "[io::artifact] Graph has {} ids but {} adjacency rows", ids.len(), adjacencies.len()
    );
    ensure!(
        data.width() == 0 || data.height() == ids.len(),
        "[io::artifact] Graph has {} ids but {} attribute rows", ids.len(), data.height()
    );

    let ids = ids.into_iter().map(Arc::<str>::from).collect();
    Ok(Graph::new(ids, &adjacencies, &weights, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Rect, point};
    use polars::prelude::*;

    fn squares(n: usize) -> Vec<Geometry<f64>> {
        (0..n).map(|i| {
            let x = i as f64;
            Geometry::Polygon(Rect::new((x, 0.), (x + 1., 1.)).to_polygon())
        }).collect()
    }

    #[test]
    fn layer_survives_encoding() {
        let layer = Layer::new("blocks", vec!["a".into(), "b".into()], squares(2), Some(4269)).unwrap()
            .with_column(Column::new("pop".into(), [5i64, 7])).unwrap();

        let bytes = encode_layer(&layer, None).unwrap();
        assert_eq!(&bytes[..4], MAGIC);

        let back = decode_layer(&bytes, None).unwrap();
        assert_eq!(back.name(), "blocks");
        assert_eq!(back.epsg(), Some(4269));
        assert_eq!(back.ids(), layer.ids());
        assert_eq!(back.shapes(), layer.shapes());
        assert!(back.data().equals(layer.data()));
    }

    #[test]
    fn all_null_attributes_keep_their_type() {
        let layer = Layer::new("strip", vec!["a".into(), "b".into()], squares(2), None).unwrap()
            .with_column(Column::new("VAP".into(), [None::<f64>, None])).unwrap()
            .with_column(Column::new("HVAP".into(), [None::<i64>, None])).unwrap();

        let back = decode_layer(&encode_layer(&layer, None).unwrap(), None).unwrap();
        assert_eq!(back.column("VAP").unwrap().dtype(), &DataType::Float64);
        assert_eq!(back.column("HVAP").unwrap().dtype(), &DataType::Int64);
        assert!(back.data().equals_missing(layer.data()));
    }

    #[test]
    fn empty_layer_survives_encoding() {
        let layer = Layer::new("none", vec![], vec![], None).unwrap();
        let back = decode_layer(&encode_layer(&layer, None).unwrap(), None).unwrap();
        assert!(back.is_empty());
        assert_eq!(back.epsg(), None);
    }

    #[test]
    fn graph_survives_encoding() {
        let layer = Layer::new("strip", vec!["x".into(), "y".into(), "z".into()], squares(3), None).unwrap();
        let graph = Graph::from_layer(&layer).unwrap();

        let back = decode_graph(&encode_graph(&graph, None).unwrap(), None).unwrap();
        assert_eq!(back.ids(), graph.ids());
        assert_eq!(back.adjacency_lists(), graph.adjacency_lists());
        assert!(back.data().equals(graph.data()));
    }

    #[test]
    fn id_field_must_match() {
        let layer = Layer::new("blocks", vec!["a".into()], squares(1), None).unwrap();
        let bytes = encode_layer(&layer, Some("GEOID20")).unwrap();

        assert!(decode_layer(&bytes, Some("GEOID20")).is_ok());
        assert!(decode_layer(&bytes, Some("GEOID10")).is_err());
        assert!(decode_layer(&bytes, None).is_err());
    }

    #[test]
    fn wrong_kind_and_corruption_are_rejected() {
        let layer = Layer::new("pts", vec!["p".into()], vec![Geometry::Point(point!(x: 0., y: 0.))], None).unwrap();
        let bytes = encode_layer(&layer, None).unwrap();

        assert!(decode_graph(&bytes, None).is_err());
        assert!(decode_layer(&bytes[..bytes.len() / 2], None).is_err());
        assert!(decode_layer(b"not an artifact", None).is_err());

        let mut bumped = bytes.clone();
        bumped[4] = VERSION + 1;
        assert!(decode_layer(&bumped, None).is_err());
    }
}
