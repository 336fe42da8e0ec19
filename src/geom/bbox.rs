use geo::{BoundingRect, MultiPolygon};
use rstar::{RTreeObject, AABB};

/// Lon/lat envelope of one dataset feature, keyed by its position in the
/// feature list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FeatureEnvelope {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl FeatureEnvelope {
    /// `None` for a feature without any vertices.
    pub(crate) fn of(position: usize, geometry: &MultiPolygon<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        Some(Self { position, envelope: AABB::from_corners(rect.min().into(), rect.max().into()) })
    }

    #[inline] pub(crate) fn position(&self) -> usize { self.position }
}

impl RTreeObject for FeatureEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope { self.envelope }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use rstar::RTree;

    #[test]
    fn empty_geometry_has_no_envelope() {
        assert!(FeatureEnvelope::of(0, &MultiPolygon(vec![])).is_none());
    }

    #[test]
    fn envelopes_are_found_by_position() {
        let square = |x: f64| MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(x, 0.0), (x + 1.0, 0.0), (x + 1.0, 1.0), (x, 1.0)]),
            vec![],
        )]);
        let tree = RTree::bulk_load(
            (0..3).filter_map(|i| FeatureEnvelope::of(i, &square(3.0 * i as f64))).collect()
        );
        let hits: Vec<usize> = tree
            .locate_in_envelope_intersecting(&AABB::from_corners([3.5, 0.5], [3.6, 0.6]))
            .map(FeatureEnvelope::position)
            .collect();
        assert_eq!(hits, vec![1]);
    }
}
