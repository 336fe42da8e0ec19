mod dataset;
mod feature;
mod query;

pub use dataset::{DataSource, Dataset, Metadata, FORMAT_VERSION};
pub use feature::{Feature, FeatureId, FeatureKind};
pub use query::{QueryResult, VillageQuery, VillageSummary, DEFAULT_QUERY_LIMIT};
