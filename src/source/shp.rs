use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::{
    common::{read_prj, read_shapefile, restore_compressed_shapefile, shape_to_geo},
    dataset::{DataSource, FeatureKind},
    geom::{reproject_to_wgs84, Crs},
    source::{BoundarySource, SourceRow},
};

/// Village polygons read from an ESRI shapefile (`.shp` + `.shx` + `.dbf`,
/// optional `.prj`).
#[derive(Debug, Clone)]
pub struct ShapefileSource {
    path: PathBuf,
    columns: Vec<String>,
    rows: Vec<SourceRow>,
    crs: Crs,
}

impl ShapefileSource {
    /// Read every polygon and its attribute row. Gzipped components are
    /// restored first when the `.shp` is missing.
    pub fn open(path: &Path) -> Result<Self> {
        let extracted = restore_compressed_shapefile(path)?;
        if !extracted.is_empty() {
            info!(parts = extracted.len(), path = %path.display(), "restored compressed shapefile");
        }

        let table = read_shapefile(path)?;
        let crs = read_prj(path)?.map_or(Crs::Geographic, |wkt| Crs::from_prj(&wkt));

        let mut skipped = 0;
        let rows: Vec<SourceRow> = table.rows.into_iter().enumerate()
            .filter_map(|(i, (shape, record))| match shape_to_geo(&shape) {
                Some(geometry) if !geometry.0.is_empty() => Some(SourceRow {
                    id: (i as u64).into(),
                    kind: FeatureKind::Village,
                    record,
                    geometry,
                }),
                _ => { skipped += 1; None }
            })
            .collect();

        if skipped > 0 {
            warn!(skipped, "ignored non-polygon or empty shapes");
        }
        if rows.is_empty() {
            bail!("no polygon features in {}", path.display());
        }

        debug!(rows = rows.len(), columns = ?table.columns, crs = ?crs, "read shapefile");
        Ok(Self { path: path.to_path_buf(), columns: table.columns, rows, crs })
    }

    #[inline] pub fn path(&self) -> &Path { &self.path }

    /// CRS of the geometries as currently held.
    #[inline] pub fn crs(&self) -> &Crs { &self.crs }
}

impl BoundarySource for ShapefileSource {
    fn origin(&self) -> DataSource { DataSource::Authoritative }

    fn column_names(&self) -> &[String] { &self.columns }

    fn rows(&self) -> &[SourceRow] { &self.rows }

    fn rows_mut(&mut self) -> &mut [SourceRow] { &mut self.rows }

    fn reproject(&mut self) -> Result<()> {
        if self.crs == Crs::Geographic { return Ok(()) }

        let shapes = self.rows.iter().map(|row| row.geometry.clone()).collect();
        let projected = reproject_to_wgs84(shapes, &self.crs)?;
        for (row, geometry) in self.rows.iter_mut().zip(projected) {
            row.geometry = geometry;
        }
        info!(from = ?self.crs, "reprojected to WGS84");
        self.crs = Crs::Geographic;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ShapefileSource::open(&dir.path().join("Karnataka.shp")).is_err());
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let shp = dir.path().join("broken.shp");
        std::fs::write(&shp, b"not a shapefile").unwrap();
        std::fs::write(dir.path().join("broken.dbf"), b"nor a dbf").unwrap();
        assert!(ShapefileSource::open(&shp).is_err());
    }
}
