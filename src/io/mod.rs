//! Transport and cache formats for a finished dataset.
//!
//! - `geojson` - the `FeatureCollection` + `metadata` payload
//! - `snapshot` - plain, gzip and minimal encodings and the snapshot files on disk

mod geojson;
mod snapshot;

pub use geojson::{from_feature_collection, to_feature_collection};
pub use snapshot::{
    decode, encode, read_snapshot, write_snapshots, Encoding, Snapshot,
    GZIP_SNAPSHOT, JSON_SNAPSHOT, MINIMAL_SNAPSHOT,
};
