use std::collections::{BTreeSet, HashMap};

use anyhow::{bail, Result};
use geo::{BoundingRect, Coord, Rect};
use rstar::{RTree, AABB};
use serde::{Deserialize, Serialize};

use crate::{
    dataset::{Feature, FeatureId, FeatureKind},
    geom::FeatureEnvelope,
    stats::{self, PopulationStats},
};

/// Snapshot format version written into every metadata block.
pub const FORMAT_VERSION: &str = "1.0";

/// Where a dataset's features came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Authoritative,
    Synthetic,
}

/// Summary derived from the village features of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Number of village features.
    #[serde(rename = "total_villages")]
    pub total_count: usize,
    pub total_population: u64,
    pub population_stats: PopulationStats,
    /// Distinct village districts, ascending.
    pub districts: Vec<String>,
    #[serde(rename = "version")]
    pub format_version: String,
    pub source: DataSource,
}

/// An immutable, validated collection of features plus derived metadata.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Vec<Feature>,
    metadata: Metadata,
    by_id: HashMap<FeatureId, usize>,
    rtree: RTree<FeatureEnvelope>,
    used_sentinel: bool,
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.features == other.features && self.metadata == other.metadata
    }
}

impl Dataset {
    /// Build a dataset, deriving metadata from the village features.
    ///
    /// Fails if two features share an id or a ring is not closed.
    pub fn new(features: Vec<Feature>, source: DataSource) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(features.len());
        for (i, feature) in features.iter().enumerate() {
            if by_id.insert(feature.id.clone(), i).is_some() {
                bail!("duplicate feature id: {}", feature.id);
            }
            if !feature.rings_closed() {
                bail!("feature {} has an unclosed ring", feature.id);
            }
        }

        let populations: Vec<u64> = features.iter()
            .filter(|f| f.is_village())
            .map(|f| f.population)
            .collect();
        let (population_stats, used_sentinel) = stats::summarize(&populations);

        let districts: BTreeSet<&str> = features.iter()
            .filter(|f| f.is_village())
            .map(|f| f.district.as_str())
            .collect();

        let metadata = Metadata {
            total_count: populations.len(),
            total_population: populations.iter().sum(),
            population_stats,
            districts: districts.into_iter().map(str::to_string).collect(),
            format_version: FORMAT_VERSION.to_string(),
            source,
        };

        let rtree = RTree::bulk_load(
            features.iter().enumerate()
                .filter_map(|(i, f)| FeatureEnvelope::of(i, &f.geometry))
                .collect()
        );

        Ok(Self { features, metadata, by_id, rtree, used_sentinel })
    }

    #[inline] pub fn features(&self) -> &[Feature] { &self.features }

    #[inline] pub fn metadata(&self) -> &Metadata { &self.metadata }

    #[inline] pub fn stats(&self) -> &PopulationStats { &self.metadata.population_stats }

    #[inline] pub fn districts(&self) -> &[String] { &self.metadata.districts }

    #[inline] pub fn source(&self) -> DataSource { self.metadata.source }

    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    /// True when the statistics were computed from the sentinel value.
    #[inline] pub fn used_sentinel_stats(&self) -> bool { self.used_sentinel }

    /// Look up a feature by id.
    pub fn get(&self, id: &FeatureId) -> Option<&Feature> {
        self.by_id.get(id).map(|&i| &self.features[i])
    }

    /// Iterate the village features in order.
    pub fn villages(&self) -> impl Iterator<Item = &Feature> + '_ {
        self.features.iter().filter(|f| f.is_village())
    }

    /// The state outline feature, if present.
    pub fn state_boundary(&self) -> Option<&Feature> {
        self.features.iter().find(|f| f.kind == FeatureKind::StateBoundary)
    }

    /// Bounding rectangle over all features.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.features.iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            ))
    }

    /// Map centre as (lon, lat): vertex mean of the state outline when present,
    /// otherwise the centre of `bounds()`.
    pub fn center(&self) -> Option<Coord<f64>> {
        if let Some(outline) = self.state_boundary() {
            let coords: Vec<Coord<f64>> = outline.geometry.0.iter()
                .flat_map(|poly| poly.exterior().0.iter().copied())
                .collect();
            if !coords.is_empty() {
                let n = coords.len() as f64;
                return Some(Coord {
                    x: coords.iter().map(|c| c.x).sum::<f64>() / n,
                    y: coords.iter().map(|c| c.y).sum::<f64>() / n,
                });
            }
        }
        self.bounds().map(|rect| rect.center())
    }

    /// Features whose bounding boxes intersect `[min_lon, min_lat, max_lon, max_lat]`,
    /// in dataset order.
    pub fn features_in_bounds(&self, bounds: [f64; 4]) -> Vec<&Feature> {
        let [min_lon, min_lat, max_lon, max_lat] = bounds;
        let envelope = AABB::from_corners([min_lon, min_lat], [max_lon, max_lat]);
        let mut indices: Vec<usize> = self.rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(FeatureEnvelope::position)
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|i| &self.features[i]).collect()
    }

    /// Keep only the first `n` features, recomputing metadata.
    pub fn truncated(&self, n: usize) -> Result<Self> {
        Self::new(self.features.iter().take(n).cloned().collect(), self.source())
    }

    /// Consume the dataset, returning its features.
    pub fn into_features(self) -> Vec<Feature> { self.features }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPolygon, Polygon};

    fn square_at(x: f64, y: f64) -> MultiPolygon<f64> {
        let ring = LineString::from(vec![(x, y), (x + 1.0, y), (x + 1.0, y + 1.0), (x, y + 1.0)]);
        MultiPolygon(vec![Polygon::new(ring, vec![])])
    }

    fn village(id: u64, district: &str, population: u64, x: f64) -> Feature {
        Feature {
            id: id.into(),
            name: format!("Village {id}"),
            district: district.into(),
            subdistrict: format!("{district} North"),
            census_id: format!("CENSUS_{id:04}"),
            population,
            geometry: square_at(x, 0.0),
            kind: FeatureKind::Village,
        }
    }

    fn outline() -> Feature {
        Feature {
            id: "state_boundary".into(),
            name: "State".into(),
            district: "Outline District".into(),
            subdistrict: String::new(),
            census_id: String::new(),
            population: 999_999,
            geometry: square_at(-10.0, -10.0),
            kind: FeatureKind::StateBoundary,
        }
    }

    #[test]
    fn metadata_excludes_state_boundary() {
        let dataset = Dataset::new(vec![
            outline(),
            village(1, "Mysore", 100, 0.0),
            village(2, "Bidar", 300, 2.0),
            village(3, "Mysore", 200, 4.0),
        ], DataSource::Synthetic).unwrap();

        let meta = dataset.metadata();
        assert_eq!(meta.total_count, 3);
        assert_eq!(meta.total_population, 600);
        assert_eq!(meta.districts, vec!["Bidar".to_string(), "Mysore".to_string()]);
        assert_eq!(meta.population_stats.max, 300.0);
        assert_eq!(meta.format_version, FORMAT_VERSION);
        assert!(!dataset.used_sentinel_stats());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = Dataset::new(vec![
            village(1, "A", 1, 0.0),
            village(1, "B", 2, 2.0),
        ], DataSource::Authoritative);
        assert!(result.is_err());
    }

    #[test]
    fn boundary_only_dataset_uses_sentinel() {
        let dataset = Dataset::new(vec![outline()], DataSource::Synthetic).unwrap();
        assert!(dataset.used_sentinel_stats());
        assert_eq!(dataset.metadata().total_population, 0);
        assert_eq!(dataset.stats().median, 1000.0);
        assert!(dataset.districts().is_empty());
    }

    #[test]
    fn lookup_and_bounds_queries() {
        let dataset = Dataset::new(vec![
            village(1, "A", 10, 0.0),
            village(2, "A", 20, 5.0),
            village(3, "B", 30, 10.0),
        ], DataSource::Authoritative).unwrap();

        assert_eq!(dataset.get(&FeatureId::Num(2)).map(|f| f.population), Some(20));
        assert!(dataset.get(&FeatureId::Num(9)).is_none());

        let hits = dataset.features_in_bounds([4.5, 0.2, 10.5, 0.8]);
        let ids: Vec<_> = hits.iter().map(|f| f.id.clone()).collect();
        assert_eq!(ids, vec![FeatureId::Num(2), FeatureId::Num(3)]);

        let bounds = dataset.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 11.0, y: 1.0 });
        assert_eq!(dataset.center(), Some(Coord { x: 5.5, y: 0.5 }));
    }

    #[test]
    fn truncation_recomputes_metadata() {
        let dataset = Dataset::new(vec![
            village(1, "A", 10, 0.0),
            village(2, "B", 20, 5.0),
            village(3, "C", 30, 10.0),
        ], DataSource::Authoritative).unwrap();

        let minimal = dataset.truncated(2).unwrap();
        assert_eq!(minimal.len(), 2);
        assert_eq!(minimal.metadata().total_population, 30);
        assert_eq!(minimal.features(), &dataset.features()[..2]);
    }
}
