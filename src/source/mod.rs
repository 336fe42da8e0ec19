//! Boundary sources: anything that can hand the loader raw polygons with an
//! attribute row each, in whatever schema it happens to use.

mod record;
mod shp;
mod synthetic;

use anyhow::{ensure, Result};
use geo::MultiPolygon;
use tracing::debug;

use crate::{
    dataset::{DataSource, Dataset, Feature, FeatureId, FeatureKind},
    geom::simplify_multipolygon,
    io::{encode, Encoding},
    reconcile::{canonical_rows, reconcile, AliasTable, Coercion, Reconciliation},
};

pub use record::{AttrValue, Record};
pub use shp::ShapefileSource;
pub use synthetic::{Region, SyntheticSource, VillageTemplate, VILLAGE_TEMPLATES};

/// One raw feature as read from a source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub id: FeatureId,
    pub kind: FeatureKind,
    pub record: Record,
    pub geometry: MultiPolygon<f64>,
}

/// Schema mapping and coerced attribute rows of a source.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub reconciliation: Reconciliation,
    pub coercion: Coercion,
}

/// Features in canonical form plus what it took to get there.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub features: Vec<Feature>,
    pub reconciliation: Reconciliation,
    /// (row index, raw text) of population values coerced to 0.
    pub malformed: Vec<(usize, String)>,
}

/// Vertex totals before and after simplification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexReduction {
    pub before: usize,
    pub after: usize,
}

impl VertexReduction {
    /// Share of vertices removed, in percent.
    pub fn percent(&self) -> f64 {
        if self.before == 0 { return 0.0 }
        100.0 * (self.before - self.after) as f64 / self.before as f64
    }
}

fn vertex_count(mp: &MultiPolygon<f64>) -> usize {
    mp.0.iter()
        .map(|poly| poly.exterior().0.len() + poly.interiors().iter().map(|r| r.0.len()).sum::<usize>())
        .sum()
}

/// A set of boundary rows the loader can normalize, whether read from disk
/// or generated.
pub trait BoundarySource {
    /// Where the rows came from.
    fn origin(&self) -> DataSource;

    /// Attribute column names in source order.
    fn column_names(&self) -> &[String];

    fn rows(&self) -> &[SourceRow];

    fn rows_mut(&mut self) -> &mut [SourceRow];

    /// Bring every geometry into WGS84 lon/lat.
    fn reproject(&mut self) -> Result<()>;

    #[inline] fn len(&self) -> usize { self.rows().len() }

    #[inline] fn is_empty(&self) -> bool { self.rows().is_empty() }

    /// Replace every geometry with its simplified version.
    fn simplify(&mut self, tolerance: f64) -> VertexReduction {
        let mut reduction = VertexReduction::default();
        for row in self.rows_mut() {
            reduction.before += vertex_count(&row.geometry);
            row.geometry = simplify_multipolygon(&row.geometry, tolerance);
            reduction.after += vertex_count(&row.geometry);
        }
        reduction
    }

    /// Map the attribute schema onto `table` and coerce every row.
    fn reconcile_schema(&self, table: &AliasTable, default_state: &str) -> Result<Reconciled> {
        let reconciliation = reconcile(self.column_names(), table);
        let coercion = canonical_rows(self.rows().iter().map(|row| &row.record), &reconciliation, default_state)?;
        ensure!(coercion.rows.len() == self.len(), "attribute table lost rows during reconciliation");
        Ok(Reconciled { reconciliation, coercion })
    }

    /// Pair each row's current geometry with its canonical attributes.
    fn features(&self, coercion: Coercion) -> Result<Vec<Feature>> {
        ensure!(coercion.rows.len() == self.len(), "coerced rows do not match source rows");
        Ok(self.rows().iter().zip(coercion.rows)
            .map(|(row, canonical)| Feature {
                id: row.id.clone(),
                name: canonical.village_name,
                district: canonical.district,
                subdistrict: canonical.subdistrict,
                census_id: canonical.census_id,
                population: canonical.population,
                geometry: row.geometry.clone(),
                kind: row.kind,
            })
            .collect())
    }

    /// Reconcile and build canonical features in one go.
    fn normalize(&self, table: &AliasTable, default_state: &str) -> Result<Normalized> {
        let Reconciled { reconciliation, coercion } = self.reconcile_schema(table, default_state)?;
        let malformed = coercion.malformed.clone();
        let features = self.features(coercion)?;
        debug!(features = features.len(), malformed = malformed.len(), "normalized source rows");
        Ok(Normalized { features, reconciliation, malformed })
    }

    /// Normalize the rows into a dataset and encode it as a snapshot payload.
    fn serialize(&self, table: &AliasTable, default_state: &str, encoding: Encoding) -> Result<Vec<u8>> {
        let normalized = self.normalize(table, default_state)?;
        encode(&Dataset::new(normalized.features, self.origin())?, encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    /// In-memory source with a custom schema.
    struct Fixed {
        columns: Vec<String>,
        rows: Vec<SourceRow>,
    }

    impl BoundarySource for Fixed {
        fn origin(&self) -> DataSource { DataSource::Authoritative }
        fn column_names(&self) -> &[String] { &self.columns }
        fn rows(&self) -> &[SourceRow] { &self.rows }
        fn rows_mut(&mut self) -> &mut [SourceRow] { &mut self.rows }
        fn reproject(&mut self) -> Result<()> { Ok(()) }
    }

    fn dense_square(n: usize) -> MultiPolygon<f64> {
        let mut coords = Vec::new();
        for i in 0..n { coords.push((i as f64 / n as f64, 0.0)) }
        for i in 0..n { coords.push((1.0, i as f64 / n as f64)) }
        for i in 0..n { coords.push((1.0 - i as f64 / n as f64, 1.0)) }
        for i in 0..n { coords.push((0.0, 1.0 - i as f64 / n as f64)) }
        MultiPolygon(vec![Polygon::new(LineString::from(coords), vec![])])
    }

    fn fixed() -> Fixed {
        let row = |i: u64, name: &str, pop: AttrValue| SourceRow {
            id: i.into(),
            kind: FeatureKind::Village,
            record: vec![
                ("VILLAGE".to_string(), AttrValue::from(name)),
                ("dist_name".to_string(), AttrValue::from("Kolar")),
                ("Population".to_string(), pop),
            ],
            geometry: dense_square(25),
        };
        Fixed {
            columns: vec!["VILLAGE".into(), "dist_name".into(), "Population".into()],
            rows: vec![row(0, "Hosur", 120.0.into()), row(1, "Malur", "unknown".into())],
        }
    }

    #[test]
    fn normalize_builds_canonical_features() {
        let normalized = fixed().normalize(&AliasTable::default(), "Karnataka").unwrap();
        assert_eq!(normalized.features.len(), 2);
        assert_eq!(normalized.features[0].name, "Hosur");
        assert_eq!(normalized.features[0].district, "Kolar");
        assert_eq!(normalized.features[0].population, 120);
        assert_eq!(normalized.features[1].population, 0);
        assert_eq!(normalized.malformed, vec![(1, "unknown".to_string())]);
        assert!(normalized.reconciliation.unmapped.contains(&"subdistric".to_string()));
    }

    #[test]
    fn simplify_reports_reduction() {
        let mut source = fixed();
        let reduction = source.simplify(0.0001);
        assert_eq!(reduction.before, 2 * 101);
        assert_eq!(reduction.after, 2 * 5);
        assert!(reduction.percent() > 90.0);
        assert!(source.rows().iter().all(|row| row.geometry.0[0].exterior().0.len() == 5));
    }

    #[test]
    fn serialize_encodes_normalized_rows() {
        let bytes = fixed().serialize(&AliasTable::default(), "Karnataka", Encoding::Gzip).unwrap();
        let snapshot = crate::io::decode(&bytes).unwrap();
        assert_eq!(snapshot.data_format, "deployable_compressed");
        assert_eq!(snapshot.dataset.source(), DataSource::Authoritative);
        assert_eq!(snapshot.dataset.metadata().total_population, 120);
    }
}
