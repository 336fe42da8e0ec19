use std::path::PathBuf;

use thiserror::Error;

/// Failure classes raised while building a dataset.
///
/// Everything except `FallbackFailed` is recovered inside the loader and only
/// surfaces as a diagnostic in the `LoadReport`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The authoritative file is missing, corrupt, or unreadable.
    #[error("authoritative source unavailable at {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// Canonical fields with no matching source column.
    #[error("no source column for canonical fields: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// A population cell that could not be read as a number; coerced to 0.
    #[error("malformed population value {raw:?} in row {row}, using 0")]
    MalformedPopulation { row: usize, raw: String },

    /// Statistics were requested over zero villages; a sentinel was used.
    #[error("no village populations to summarize, using sentinel")]
    EmptyStatistics,

    /// A cached snapshot could not be read or written.
    #[error("snapshot cache: {0}")]
    Snapshot(String),

    /// Even the synthetic dataset could not be produced.
    #[error("could not build synthetic fallback dataset: {0}")]
    FallbackFailed(String),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
