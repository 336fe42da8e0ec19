use std::fmt;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Stable identifier of a feature: the source row index for shapefile data,
/// a generated index for synthetic villages, or a fixed text key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Num(u64),
    Text(String),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Num(n) => write!(f, "{n}"),
            FeatureId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for FeatureId {
    fn from(n: u64) -> Self { FeatureId::Num(n) }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self { FeatureId::Text(s.to_string()) }
}

/// What a feature represents on the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    #[default]
    Village,
    /// The enclosing state outline; excluded from statistics and district lists.
    StateBoundary,
}

impl FeatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Village => "village",
            FeatureKind::StateBoundary => "state_boundary",
        }
    }
}

/// One geographic entity with its canonical attributes.
///
/// Geometry is lon/lat (x = longitude, y = latitude). Rings are closed because
/// they are built through `geo::Polygon::new`.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    pub district: String,
    pub subdistrict: String,
    pub census_id: String,
    pub population: u64,
    pub geometry: MultiPolygon<f64>,
    pub kind: FeatureKind,
}

impl Feature {
    #[inline] pub fn is_village(&self) -> bool { self.kind == FeatureKind::Village }

    /// Total number of vertices over every ring of every polygon.
    pub fn vertex_count(&self) -> usize {
        self.geometry.0.iter()
            .map(|poly| poly.exterior().0.len() + poly.interiors().iter().map(|r| r.0.len()).sum::<usize>())
            .sum()
    }

    /// Whether every ring has identical first and last vertices.
    pub fn rings_closed(&self) -> bool {
        self.geometry.0.iter().all(|poly| {
            std::iter::once(poly.exterior())
                .chain(poly.interiors())
                .all(|ring| ring.0.first() == ring.0.last())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn square() -> MultiPolygon<f64> {
        let ring = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        MultiPolygon(vec![Polygon::new(ring, vec![])])
    }

    #[test]
    fn polygon_construction_closes_rings() {
        let feature = Feature {
            id: 1.into(),
            name: "A".into(),
            district: "D".into(),
            subdistrict: "S".into(),
            census_id: "C".into(),
            population: 10,
            geometry: square(),
            kind: FeatureKind::Village,
        };
        assert!(feature.rings_closed());
        assert_eq!(feature.vertex_count(), 5);
    }

    #[test]
    fn feature_id_serializes_untagged() {
        assert_eq!(serde_json::to_string(&FeatureId::Num(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&FeatureId::from("state_boundary")).unwrap(), "\"state_boundary\"");
        let id: FeatureId = serde_json::from_str("42").unwrap();
        assert_eq!(id, FeatureId::Num(42));
    }

    #[test]
    fn kind_names() {
        assert_eq!(FeatureKind::StateBoundary.as_str(), "state_boundary");
        assert_eq!(serde_json::to_string(&FeatureKind::Village).unwrap(), "\"village\"");
    }
}
