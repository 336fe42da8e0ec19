//! Shapefile fixtures shared by the integration tests.
#![allow(dead_code)]

use std::path::Path;

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing};

/// One fixture village: name, district, raw population text, lower-left corner (lon, lat).
pub type Village = (&'static str, &'static str, &'static str, f64, f64);

pub const VILLAGES: [Village; 3] = [
    ("Hosur", "Kolar", "1200", 78.10, 13.10),
    ("Malur", "Kolar", "n/a", 78.00, 13.00),
    ("Hunsur", "Mysore", "850", 76.20, 12.30),
];

/// Clockwise square of side 0.01 degrees with `per_side` points on each edge.
pub fn dense_square(x: f64, y: f64, per_side: usize) -> Vec<Point> {
    let s = 0.01;
    let step = s / per_side as f64;
    let mut pts = Vec::with_capacity(4 * per_side + 1);
    for i in 0..per_side { pts.push(Point { x, y: y + i as f64 * step }) }
    for i in 0..per_side { pts.push(Point { x: x + i as f64 * step, y: y + s }) }
    for i in 0..per_side { pts.push(Point { x: x + s, y: y + s - i as f64 * step }) }
    for i in 0..per_side { pts.push(Point { x: x + s - i as f64 * step, y }) }
    pts.push(pts[0]);
    pts
}

/// Write a shapefile with columns VILLAGE, dist_name, TOT_POP (text),
/// passing every vertex through `transform`.
pub fn write_villages(path: &Path, villages: &[Village], transform: impl Fn(f64, f64) -> (f64, f64)) {
    let table = TableWriterBuilder::new()
        .add_character_field(FieldName::try_from("VILLAGE").unwrap(), 40)
        .add_character_field(FieldName::try_from("dist_name").unwrap(), 40)
        .add_character_field(FieldName::try_from("TOT_POP").unwrap(), 12);
    let mut writer = shapefile::Writer::from_path(path, table).unwrap();

    for &(name, district, population, x, y) in villages {
        let ring = dense_square(x, y, 25).into_iter()
            .map(|p| { let (x, y) = transform(p.x, p.y); Point { x, y } })
            .collect();
        let polygon = Polygon::new(PolygonRing::Outer(ring));

        let mut record = Record::default();
        record.insert("VILLAGE".to_string(), FieldValue::Character(Some(name.to_string())));
        record.insert("dist_name".to_string(), FieldValue::Character(Some(district.to_string())));
        record.insert("TOT_POP".to_string(), FieldValue::Character(Some(population.to_string())));
        writer.write_shape_and_record(&polygon, &record).unwrap();
    }
}

/// Write `villages` in lon/lat to `<dir>/Karnataka.shp` and return its path.
pub fn write_lon_lat(dir: &Path, villages: &[Village]) -> std::path::PathBuf {
    let path = dir.join("Karnataka.shp");
    write_villages(&path, villages, |x, y| (x, y));
    path
}
