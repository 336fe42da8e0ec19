use geo::{LineString, MultiPolygon, Polygon};

/// Simplified Karnataka outline as (lon, lat), clockwise from the north-west.
const KARNATAKA_OUTLINE: [(f64, f64); 15] = [
    (74.4349, 16.2050), // Belgaum
    (74.8343, 17.3298),
    (76.2569, 18.5204), // Maharashtra border
    (77.4161, 17.3298),
    (77.9214, 16.2076), // Telangana border
    (77.9218, 15.1398),
    (77.5681, 14.4644), // Andhra Pradesh border
    (77.5946, 13.9299),
    (76.6394, 12.9716),
    (76.6394, 12.2958), // Mysore
    (74.8560, 12.9141), // Mangalore
    (74.7421, 13.3409),
    (74.5089, 14.6802),
    (74.2760, 15.8497),
    (74.4349, 16.2050),
];

/// The state outline ring. First and last vertices coincide.
pub fn state_outline() -> LineString<f64> {
    LineString::from(KARNATAKA_OUTLINE.to_vec())
}

pub fn state_outline_geometry() -> MultiPolygon<f64> {
    MultiPolygon(vec![Polygon::new(state_outline(), vec![])])
}
