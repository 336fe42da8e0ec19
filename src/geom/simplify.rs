use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use rstar::{
    primitives::{GeomWithData, Line},
    RTree, AABB,
};

/// How many times the tolerance is halved before a ring is kept unchanged.
const MAX_RETRIES: usize = 4;

/// Distance from `p` to the segment `a`-`b`.
pub fn segment_distance(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 { return (p.x - a.x).hypot(p.y - a.y) }

    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    (p.x - (a.x + t * dx)).hypot(p.y - (a.y + t * dy))
}

/// Douglas–Peucker over an open run of coordinates. Endpoints are always kept.
fn douglas_peucker(coords: &[Coord<f64>], tolerance: f64) -> Vec<Coord<f64>> {
    if coords.len() < 3 { return coords.to_vec() }

    let mut keep = vec![false; coords.len()];
    keep[0] = true;
    keep[coords.len() - 1] = true;

    let mut stack = vec![(0, coords.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        let (mut farthest, mut max_dist) = (first, 0.0);
        for i in first + 1..last {
            let d = segment_distance(coords[i], coords[first], coords[last]);
            if d > max_dist { (farthest, max_dist) = (i, d) }
        }
        if max_dist > tolerance {
            keep[farthest] = true;
            stack.push((first, farthest));
            stack.push((farthest, last));
        }
    }

    coords.iter().zip(keep).filter_map(|(c, k)| k.then_some(*c)).collect()
}

/// Simplify a closed ring. The ring is split at its vertex farthest from the
/// start so both halves have distinct endpoints. Returns `None` if the ring
/// would collapse below a triangle.
fn simplify_ring(ring: &LineString<f64>, tolerance: f64) -> Option<LineString<f64>> {
    let coords = &ring.0;
    if coords.len() <= 4 { return Some(ring.clone()) }

    let start = coords[0];
    let split = (1..coords.len() - 1)
        .max_by(|&a, &b| {
            let da = (coords[a].x - start.x).hypot(coords[a].y - start.y);
            let db = (coords[b].x - start.x).hypot(coords[b].y - start.y);
            da.total_cmp(&db)
        })?;

    let mut out = douglas_peucker(&coords[..=split], tolerance);
    out.pop();
    out.extend(douglas_peucker(&coords[split..], tolerance));

    (out.len() >= 4).then(|| LineString::from(out))
}

/// Orientation of the triple (a, b, c): positive for counter-clockwise.
#[inline]
fn orient(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Whether segments p1-p2 and q1-q2 touch or cross.
fn segments_intersect(p1: Coord<f64>, p2: Coord<f64>, q1: Coord<f64>, q2: Coord<f64>) -> bool {
    let on_segment = |a: Coord<f64>, b: Coord<f64>, c: Coord<f64>| {
        c.x >= a.x.min(b.x) && c.x <= a.x.max(b.x) && c.y >= a.y.min(b.y) && c.y <= a.y.max(b.y)
    };

    let (d1, d2) = (orient(q1, q2, p1), orient(q1, q2, p2));
    let (d3, d4) = (orient(p1, p2, q1), orient(p1, p2, q2));

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0)) {
        return true;
    }
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

/// Edge `i` of a ring, running from vertex `i` to `i + 1`.
type Edge = GeomWithData<Line<[f64; 2]>, usize>;

fn edge_envelope(a: Coord<f64>, b: Coord<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners(a.into(), b.into())
}

/// R-tree over the edges of a ring; intersection checks only test edges
/// whose envelopes overlap.
fn edge_index(ring: &LineString<f64>) -> RTree<Edge> {
    RTree::bulk_load(
        ring.0.windows(2).enumerate()
            .map(|(i, w)| Edge::new(Line::new(w[0].into(), w[1].into()), i))
            .collect()
    )
}

/// Whether a closed ring has no intersections between non-adjacent edges.
pub fn ring_is_simple(ring: &LineString<f64>) -> bool {
    let c = &ring.0;
    let n = c.len().saturating_sub(1); // edge count
    let index = edge_index(ring);
    (0..n).all(|i| {
        index.locate_in_envelope_intersecting(&edge_envelope(c[i], c[i + 1]))
            .map(|edge| edge.data)
            .filter(|&j| j > i + 1 && !(i == 0 && j == n - 1))
            .all(|j| !segments_intersect(c[i], c[i + 1], c[j], c[j + 1]))
    })
}

/// Whether two rings share no edge intersections.
fn rings_disjoint(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    let index = edge_index(b);
    let d = &b.0;
    a.lines().all(|la| {
        index.locate_in_envelope_intersecting(&edge_envelope(la.start, la.end))
            .all(|edge| !segments_intersect(la.start, la.end, d[edge.data], d[edge.data + 1]))
    })
}

/// Check that a simplified polygon kept the topology of a valid input:
/// simple rings, holes not touching the shell or each other, holes inside.
fn topology_ok(poly: &Polygon<f64>) -> bool {
    let shell = Polygon::new(poly.exterior().clone(), vec![]);
    ring_is_simple(poly.exterior())
        && poly.interiors().iter().enumerate().all(|(i, hole)| {
            ring_is_simple(hole)
                && rings_disjoint(poly.exterior(), hole)
                && hole.0.first().map_or(true, |c| shell.contains(&Point::from(*c)))
                && poly.interiors()[i + 1..].iter().all(|other| rings_disjoint(hole, other))
        })
}

/// Simplify a polygon, halving the tolerance until topology is preserved.
/// Falls back to the input polygon if no tolerance works.
pub fn simplify_polygon(poly: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    let mut tol = tolerance;
    for _ in 0..=MAX_RETRIES {
        let exterior = simplify_ring(poly.exterior(), tol);
        let interiors: Option<Vec<_>> = poly.interiors().iter()
            .map(|hole| simplify_ring(hole, tol))
            .collect();

        if let (Some(exterior), Some(interiors)) = (exterior, interiors) {
            let candidate = Polygon::new(exterior, interiors);
            if topology_ok(&candidate) { return candidate }
        }
        tol /= 2.0;
    }
    poly.clone()
}

/// Simplify every polygon in a multipolygon, producing a new geometry.
pub fn simplify_multipolygon(mp: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    MultiPolygon(mp.0.iter().map(|poly| simplify_polygon(poly, tolerance)).collect())
}

/// Largest distance from any vertex of `original` to the ring `simplified`.
pub fn max_deviation(original: &LineString<f64>, simplified: &LineString<f64>) -> f64 {
    original.0.iter()
        .map(|&p| simplified.lines()
            .map(|line| segment_distance(p, line.start, line.end))
            .fold(f64::INFINITY, f64::min))
        .fold(0.0, f64::max)
}
