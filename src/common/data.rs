use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use shapefile::{dbase, Reader, Shape};

use crate::source::{AttrValue, Record};

/// Raw content of a shapefile: columns in `.dbf` order and every shape with
/// its attribute row.
pub struct ShapefileTable {
    pub columns: Vec<String>,
    pub rows: Vec<(Shape, Record)>,
}

/// Column names in the order the `.dbf` header declares them.
fn dbf_columns(path: &Path) -> Result<Vec<String>> {
    let dbf = path.with_extension("dbf");
    let reader = dbase::Reader::from_path(&dbf)
        .with_context(|| format!("Failed to open attribute table: {}", dbf.display()))?;
    Ok(reader.fields().iter().map(|field| field.name().to_string()).collect())
}

/// Reads all shapes + attribute records from a given `.shp` file path.
/// Attribute rows follow the `.dbf` column order.
pub fn read_shapefile(path: &Path) -> Result<ShapefileTable> {
    let columns = dbf_columns(path)?;
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut rows = Vec::with_capacity(reader.shape_count()?);
    for (i, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result.with_context(|| format!("Error reading shape+record {i}"))?;
        let row: Record = columns.iter()
            .map(|name| {
                let value = record.get(name).cloned().map_or(AttrValue::Null, AttrValue::from);
                (name.clone(), value)
            })
            .collect();
        rows.push((shape, row));
    }
    Ok(ShapefileTable { columns, rows })
}

/// Reads the `.prj` sidecar next to `path`, if there is one.
pub fn read_prj(path: &Path) -> Result<Option<String>> {
    let prj = path.with_extension("prj");
    if !prj.exists() { return Ok(None) }
    fs::read_to_string(&prj)
        .map(Some)
        .with_context(|| format!("Failed to read projection file: {}", prj.display()))
}
