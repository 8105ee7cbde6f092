//! CSV writing operations.

use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::CsvWriter};

/// Write a DataFrame to a CSV file.
pub(crate) fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::csv::write] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(BufWriter::new(file))
        .finish(df)
        .with_context(|| format!("[io::csv::write] Failed to write CSV to {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut df = df!("geo_id" => ["p1", "p2"], "pop" => [3i64, 0]).unwrap();
        write_csv(&mut df, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "geo_id,pop\np1,3\np2,0\n");
    }
}
