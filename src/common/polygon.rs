use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::{PolygonRing, Shape};

/// Get the signed area of a closed coordinate list (negative for clockwise).
fn signed_area(pts: &[Coord<f64>]) -> f64 {
    pts.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum::<f64>() / 2.0
}

/// Group shapefile rings into polygons. Shapefiles store each clockwise
/// exterior followed by its counter-clockwise holes.
fn rings_to_geo<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> (f64, f64)) -> MultiPolygon<f64> {
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        let mut coords: Vec<Coord<f64>> = ring.points().iter()
            .map(|p| { let (x, y) = xy(p); Coord { x, y } })
            .collect();
        if coords.len() < 3 { continue }
        if coords.first() != coords.last() { coords.push(coords[0]) }

        // A counter-clockwise ring before any exterior is a mis-oriented exterior.
        if signed_area(&coords) < 0.0 || exterior.is_none() {
            if let Some(ext) = exterior.take() {
                polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
            }
            exterior = Some(LineString(coords));
        } else {
            holes.push(LineString(coords));
        }
    }
    if let Some(ext) = exterior {
        polys.push(Polygon::new(ext, holes));
    }

    MultiPolygon(polys)
}

/// Convert a polygon shape (plain, M or Z) to a lon/lat `MultiPolygon`.
/// Returns `None` for non-polygon shapes.
pub fn shape_to_geo(shape: &Shape) -> Option<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(p) => Some(rings_to_geo(p.rings(), |pt| (pt.x, pt.y))),
        Shape::PolygonM(p) => Some(rings_to_geo(p.rings(), |pt| (pt.x, pt.y))),
        Shape::PolygonZ(p) => Some(rings_to_geo(p.rings(), |pt| (pt.x, pt.y))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefile::Point;

    fn ring(pts: &[(f64, f64)]) -> Vec<Point> {
        pts.iter().map(|&(x, y)| Point { x, y }).collect()
    }

    #[test]
    fn exterior_with_hole() {
        let polygon = shapefile::Polygon::with_rings(vec![
            PolygonRing::Outer(ring(&[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0), (0.0, 0.0)])),
            PolygonRing::Inner(ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0), (1.0, 1.0)])),
        ]);
        let mp = shape_to_geo(&Shape::Polygon(polygon)).unwrap();
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert_eq!(mp.0[0].exterior().0.first(), mp.0[0].exterior().0.last());
    }

    #[test]
    fn two_exteriors_make_two_polygons() {
        let polygon = shapefile::Polygon::with_rings(vec![
            PolygonRing::Outer(ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)])),
            PolygonRing::Outer(ring(&[(5.0, 5.0), (5.0, 6.0), (6.0, 6.0), (6.0, 5.0), (5.0, 5.0)])),
        ]);
        let mp = shape_to_geo(&Shape::Polygon(polygon)).unwrap();
        assert_eq!(mp.0.len(), 2);
    }

    #[test]
    fn points_are_not_polygons() {
        assert!(shape_to_geo(&Shape::Point(Point { x: 1.0, y: 2.0 })).is_none());
    }
}
