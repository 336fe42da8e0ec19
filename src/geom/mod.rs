mod bbox;
mod generate;
mod outline;
mod proj;
mod simplify;

pub(crate) use bbox::FeatureEnvelope;
pub use generate::{village_footprint, village_ring, VillageStyle};
pub use outline::{state_outline, state_outline_geometry};
pub use proj::{reproject_to_wgs84, Crs};
pub use simplify::{max_deviation, ring_is_simple, simplify_multipolygon, simplify_polygon};
