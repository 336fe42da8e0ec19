#![doc = "Village boundary dataset pipeline: load, normalize, simplify, summarize and package"]
mod common;
mod config;
mod dataset;
mod error;
mod geom;
mod handle;
mod io;
mod loader;
mod logging;
mod reconcile;
mod source;
mod stats;

#[doc(inline)]
pub use config::{PipelineConfig, SYNTHETIC_RANGE};

#[doc(inline)]
pub use dataset::{
    DataSource, Dataset, Feature, FeatureId, FeatureKind, Metadata, QueryResult, VillageQuery,
    VillageSummary, DEFAULT_QUERY_LIMIT, FORMAT_VERSION,
};

#[doc(inline)]
pub use error::{PipelineError, Result};

#[doc(inline)]
pub use geom::{
    max_deviation, reproject_to_wgs84, ring_is_simple, simplify_multipolygon, simplify_polygon,
    state_outline, village_footprint, village_ring, Crs, VillageStyle,
};

#[doc(inline)]
pub use handle::DatasetHandle;

#[doc(inline)]
pub use io::{
    decode, encode, from_feature_collection, read_snapshot, to_feature_collection,
    write_snapshots, Encoding, Snapshot, GZIP_SNAPSHOT, JSON_SNAPSHOT, MINIMAL_SNAPSHOT,
};

#[doc(inline)]
pub use loader::{DatasetLoader, LoadReport, LoadState};

#[doc(inline)]
pub use logging::init_logging;

#[doc(inline)]
pub use reconcile::{
    canonical_rows, reconcile, AliasTable, CanonicalField, CanonicalRow, Coercion, FieldRule,
    Reconciliation,
};

#[doc(inline)]
pub use source::{
    AttrValue, BoundarySource, Normalized, Reconciled, Record, Region, ShapefileSource, SourceRow,
    SyntheticSource, VertexReduction, VillageTemplate, VILLAGE_TEMPLATES,
};

#[doc(inline)]
pub use stats::{median_floor, percentile, summarize, PopulationStats, SENTINEL_POPULATION};
