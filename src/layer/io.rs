use std::path::Path;

use crate::{error::{Error, Result}, io::csv, layer::Layer};

impl Layer {
    /// Write the attribute table (`geo_id` first) to a CSV file.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        csv::write_csv(&mut self.data().clone(), path)
            .map_err(|source| Error::Write { path: path.to_path_buf(), source })
    }
}
