use std::f64::consts::TAU;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Footprint shape of a generated settlement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VillageStyle {
    /// Small and roughly circular.
    Compact,
    /// Larger and more irregular.
    Spread,
    /// Stretched east-west, as along a road or river.
    Linear,
    #[default]
    Standard,
}

impl VillageStyle {
    /// Base radius in degrees.
    #[inline]
    pub fn radius(&self) -> f64 {
        match self {
            VillageStyle::Compact => 0.005,
            VillageStyle::Spread => 0.008,
            VillageStyle::Linear | VillageStyle::Standard => 0.006,
        }
    }

    /// Number of distinct vertices before closing.
    #[inline]
    pub fn complexity(&self) -> usize {
        match self {
            VillageStyle::Compact => 6,
            VillageStyle::Spread => 10,
            VillageStyle::Linear | VillageStyle::Standard => 8,
        }
    }
}

/// Generate a closed footprint ring around (`center_lat`, `center_lon`).
///
/// Coordinates are `x = lon, y = lat`. Angles are spaced evenly around a full
/// turn and jittered; radius and position get bounded random noise. Linear
/// footprints skip the angle jitter and are squashed in latitude.
pub fn village_ring<R: Rng + ?Sized>(center_lat: f64, center_lon: f64, style: VillageStyle, rng: &mut R) -> LineString<f64> {
    let n = style.complexity();
    let base = style.radius();

    let mut coords: Vec<Coord<f64>> = (0..n)
        .map(|i| {
            let even = TAU * i as f64 / n as f64;
            let (lat_offset, lon_offset) = match style {
                VillageStyle::Linear => {
                    let r = base * rng.random_range(0.7..1.3);
                    (
                        r * 0.5 * even.cos() + rng.random_range(-0.001..0.001),
                        r * 1.2 * even.sin() + rng.random_range(-0.001..0.001),
                    )
                }
                _ => {
                    let angle = even + rng.random_range(-0.3..0.3);
                    let r = base * rng.random_range(0.6..1.4);
                    (
                        r * angle.cos() + rng.random_range(-0.002..0.002),
                        r * angle.sin() + rng.random_range(-0.002..0.002),
                    )
                }
            };
            Coord { x: center_lon + lon_offset, y: center_lat + lat_offset }
        })
        .collect();

    coords.push(coords[0]);
    LineString(coords)
}

/// Footprint as a single-polygon `MultiPolygon`, the shape every feature carries.
pub fn village_footprint<R: Rng + ?Sized>(center_lat: f64, center_lon: f64, style: VillageStyle, rng: &mut R) -> MultiPolygon<f64> {
    MultiPolygon(vec![Polygon::new(village_ring(center_lat, center_lon, style, rng), vec![])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const STYLES: [VillageStyle; 4] = [
        VillageStyle::Compact, VillageStyle::Spread, VillageStyle::Linear, VillageStyle::Standard,
    ];

    #[test]
    fn rings_are_closed_with_expected_vertex_count() {
        let mut rng = StdRng::seed_from_u64(1);
        for style in STYLES {
            let ring = village_ring(15.0, 76.0, style, &mut rng);
            assert_eq!(ring.0.len(), style.complexity() + 1, "{style:?}");
            assert_eq!(ring.0.first(), ring.0.last(), "{style:?}");
        }
    }

    #[test]
    fn vertices_stay_near_center() {
        let mut rng = StdRng::seed_from_u64(2);
        for style in STYLES {
            // Largest radius factor plus the noise term on each axis.
            let reach = style.radius() * 1.4 * 1.2 + 0.002;
            for _ in 0..50 {
                let ring = village_ring(12.5, 77.0, style, &mut rng);
                for c in &ring.0 {
                    assert!((c.x - 77.0).abs() <= reach, "{style:?} lon {}", c.x);
                    assert!((c.y - 12.5).abs() <= reach, "{style:?} lat {}", c.y);
                }
            }
        }
    }

    #[test]
    fn linear_footprints_are_elongated_in_longitude() {
        let mut rng = StdRng::seed_from_u64(3);
        let ring = village_ring(14.0, 75.0, VillageStyle::Linear, &mut rng);
        let width = ring.0.iter().map(|c| c.x).fold(f64::MIN, f64::max) - ring.0.iter().map(|c| c.x).fold(f64::MAX, f64::min);
        let height = ring.0.iter().map(|c| c.y).fold(f64::MIN, f64::max) - ring.0.iter().map(|c| c.y).fold(f64::MAX, f64::min);
        assert!(width > height);
    }

    #[test]
    fn same_seed_same_ring() {
        let a = village_ring(13.0, 76.0, VillageStyle::Spread, &mut StdRng::seed_from_u64(42));
        let b = village_ring(13.0, 76.0, VillageStyle::Spread, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn style_names_are_snake_case() {
        assert_eq!(serde_json::to_string(&VillageStyle::Compact).unwrap(), "\"compact\"");
        assert_eq!(serde_json::from_str::<VillageStyle>("\"linear\"").unwrap(), VillageStyle::Linear);
    }
}
