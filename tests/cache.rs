use std::{fs, path::{Path, PathBuf}};

use blockwalk::{
    Artifact, ArtifactKind, CacheKey, CheckpointStore, Config, Error, GroupAssignment, Layer, Loader, Lookup,
    Partition, aggregate, assign,
};
use polars::prelude::DataType;
use shapefile::{
    Point, Polygon, PolygonRing,
    dbase::{FieldName, FieldValue, Record, TableWriterBuilder},
};

/// Write a 2x1 strip of unit squares with a GEOID and a POP field.
fn write_strip(dir: &Path) -> PathBuf {
    let path = dir.join("strip.shp");
    let table = TableWriterBuilder::new()
        .add_character_field(FieldName::try_from("GEOID").unwrap(), 8)
        .add_numeric_field(FieldName::try_from("POP").unwrap(), 10, 0);
    let mut writer = shapefile::Writer::from_path(&path, table).unwrap();

    for (i, id) in ["w", "e"].into_iter().enumerate() {
        let x = i as f64;
        let square = Polygon::new(PolygonRing::Outer(vec![
            Point::new(x, 0.0),
            Point::new(x, 1.0),
            Point::new(x + 1.0, 1.0),
            Point::new(x + 1.0, 0.0),
            Point::new(x, 0.0),
        ]));
        let mut record = Record::default();
        record.insert("GEOID".to_string(), FieldValue::Character(Some(id.to_string())));
        record.insert("POP".to_string(), FieldValue::Numeric(Some(10.0 * (i + 1) as f64)));
        writer.write_shape_and_record(&square, &record).unwrap();
    }
    drop(writer);
    path
}

/// Write a 2x1 strip with an all-null VAP field and an `N(4,0)` DISTRICT field.
fn write_districts(dir: &Path) -> PathBuf {
    let path = dir.join("districts.shp");
    let table = TableWriterBuilder::new()
        .add_character_field(FieldName::try_from("GEOID").unwrap(), 8)
        .add_numeric_field(FieldName::try_from("VAP").unwrap(), 10, 0)
        .add_numeric_field(FieldName::try_from("DISTRICT").unwrap(), 4, 0);
    let mut writer = shapefile::Writer::from_path(&path, table).unwrap();

    for (i, id) in ["w", "e"].into_iter().enumerate() {
        let x = i as f64;
        let square = Polygon::new(PolygonRing::Outer(vec![
            Point::new(x, 0.0),
            Point::new(x, 1.0),
            Point::new(x + 1.0, 1.0),
            Point::new(x + 1.0, 0.0),
            Point::new(x, 0.0),
        ]));
        let mut record = Record::default();
        record.insert("GEOID".to_string(), FieldValue::Character(Some(id.to_string())));
        record.insert("VAP".to_string(), FieldValue::Numeric(None));
        record.insert("DISTRICT".to_string(), FieldValue::Numeric(Some((i + 1) as f64)));
        writer.write_shape_and_record(&square, &record).unwrap();
    }
    drop(writer);
    path
}

fn loader() -> Loader {
    Loader::new(Config::default().with_id_field("GEOID"))
}

#[test]
fn first_load_reads_source_and_writes_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_strip(dir.path());

    let layer = loader().load_layer(&path).unwrap();
    assert_eq!(layer.ids().iter().map(|id| id.as_ref()).collect::<Vec<_>>(), vec!["w", "e"]);
    assert_eq!(layer.column("POP").unwrap().f64().unwrap().get(1), Some(20.0));

    let key = CacheKey::new(&path, ArtifactKind::Layer);
    assert!(key.path().is_file());
    assert!(matches!(loader().lookup::<Layer>(&path), Lookup::Hit(_)));
}

#[test]
fn cache_hit_does_not_touch_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_strip(dir.path());
    let first = loader().load_layer(&path).unwrap();

    fs::remove_file(&path).unwrap();
    let second = loader().load_layer(&path).unwrap();
    assert_eq!(second.ids(), first.ids());
    assert!(second.data().equals(first.data()));
}

#[test]
fn corrupt_artifact_is_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_strip(dir.path());
    let key = CacheKey::new(&path, ArtifactKind::Layer);
    fs::write(key.path(), b"BWCA garbage").unwrap();

    let layer = loader().load_layer(&path).unwrap();
    assert_eq!(layer.len(), 2);

    let rewritten = fs::read(key.path()).unwrap();
    assert!(Layer::decode(&rewritten, Some("GEOID")).is_ok());
}

#[test]
fn cache_hit_keeps_column_types_of_all_null_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_districts(dir.path());

    let cold = loader().load_layer(&path).unwrap();
    let warm = loader().load_layer(&path).unwrap();
    assert!(CacheKey::new(&path, ArtifactKind::Layer).path().is_file());

    assert_eq!(cold.column("VAP").unwrap().dtype(), &DataType::Float64);
    assert_eq!(warm.column("VAP").unwrap().dtype(), &DataType::Float64);
    assert_eq!(warm.column("DISTRICT").unwrap().dtype(), &DataType::Float64);
    assert!(warm.data().equals_missing(cold.data()));

    let assignment = assign(&warm, &warm).unwrap();
    let enriched = aggregate(&warm, &warm, &assignment, &["VAP"]).unwrap();
    assert_eq!(enriched.column("VAP").unwrap().f64().unwrap().get(0), Some(0.0));
}

#[test]
fn partition_reads_numeric_dbf_district_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_districts(dir.path());

    for _ in 0..2 {
        let graph = loader().load_graph(&path).unwrap();
        let partition = Partition::from_attribute(graph, "DISTRICT").unwrap();
        let assignment = partition.group_assignment();
        assert_eq!(assignment["w"], 1);
        assert_eq!(assignment["e"], 2);
    }
}

#[test]
fn graph_and_layer_artifacts_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_strip(dir.path());

    let graph = loader().load_graph(&path).unwrap();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edges(0).collect::<Vec<_>>(), vec![1]);

    assert!(CacheKey::new(&path, ArtifactKind::Graph).path().is_file());
    assert!(!CacheKey::new(&path, ArtifactKind::Layer).path().exists());

    fs::remove_file(&path).unwrap();
    let cached = loader().load_graph(&path).unwrap();
    assert_eq!(cached.ids(), graph.ids());
    assert!(matches!(loader().load_layer(&path), Err(Error::SourceNotFound { .. })));
}

#[test]
fn changing_the_id_field_rebuilds_the_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_strip(dir.path());

    let by_geoid = loader().load_layer(&path).unwrap();
    assert_eq!(by_geoid.id(0), "w");

    let by_row = Loader::default().load_layer(&path).unwrap();
    assert_eq!(by_row.ids().iter().map(|id| id.as_ref()).collect::<Vec<_>>(), vec!["0", "1"]);

    let bytes = fs::read(CacheKey::new(&path, ArtifactKind::Layer).path()).unwrap();
    assert!(Layer::decode(&bytes, None).is_ok());
    assert!(Layer::decode(&bytes, Some("GEOID")).is_err());
}

#[test]
fn missing_source_without_artifact_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.shp");
    match loader().load_layer(&path) {
        Err(Error::SourceNotFound { path: missing }) => assert_eq!(missing, path),
        other => panic!("expected SourceNotFound, got {other:?}"),
    }
}

#[test]
fn unreadable_source_is_a_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.shp");
    fs::write(&path, b"not a shapefile").unwrap();
    assert!(matches!(loader().load_layer(&path), Err(Error::Source { .. })));
}

#[test]
fn partition_checkpoint_keeps_only_the_assignment() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_strip(dir.path());
    let graph = loader().load_graph(&path).unwrap();

    let store = CheckpointStore::new(dir.path().join("checkpoints"));
    let partition = Partition::new(graph.clone(), vec![1, 2]).unwrap();
    let saved = store.checkpoint_assignment("plan", &partition).unwrap();
    assert_eq!(saved, partition.group_assignment());

    let other = Partition::new(graph, vec![7, 7]).unwrap();
    let restored = store.checkpoint_assignment("plan", &other).unwrap();
    assert_eq!(restored, saved);

    let text = fs::read_to_string(dir.path().join("checkpoints/plan.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, serde_json::json!({ "w": 1, "e": 2 }));
}

#[test]
fn checkpoint_names_cannot_escape_the_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    assert!(matches!(store.checkpoint("../up", 1u8), Err(Error::InvalidCheckpointName(_))));
    assert!(matches!(store.checkpoint("a/b", 1u8), Err(Error::InvalidCheckpointName(_))));
    assert_eq!(store.checkpoint("ok", 1u8).unwrap(), 1);
}
