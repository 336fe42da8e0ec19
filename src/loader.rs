//! The dataset loader: authoritative shapefile first, synthetic fallback
//! second, never nothing.

use std::fmt;
use std::path::PathBuf;

use anyhow::Context;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

use crate::{
    config::PipelineConfig,
    dataset::Dataset,
    error::{PipelineError, Result},
    io::{read_snapshot, write_snapshots},
    reconcile::AliasTable,
    source::{BoundarySource, ShapefileSource, SyntheticSource},
};

/// Steps of a load, in the order they can be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// Look for a snapshot in the cache directory.
    ReadCache,
    AttemptAuthoritative,
    Reconcile,
    Simplify,
    GenerateSynthetic,
    Stats,
    Ready,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadState::ReadCache => "READ_CACHE",
            LoadState::AttemptAuthoritative => "ATTEMPT_AUTHORITATIVE",
            LoadState::Reconcile => "RECONCILE",
            LoadState::Simplify => "SIMPLIFY",
            LoadState::GenerateSynthetic => "GENERATE_SYNTHETIC",
            LoadState::Stats => "STATS",
            LoadState::Ready => "READY",
        })
    }
}

/// Outcome of a successful load.
#[derive(Debug)]
pub struct LoadReport {
    pub dataset: Dataset,
    /// Every state entered, ending in `Ready`.
    pub states: Vec<LoadState>,
    /// Recovered problems, in the order they were met.
    pub diagnostics: Vec<PipelineError>,
    /// Snapshot the dataset was read from, on a cache hit.
    pub cache_hit: Option<PathBuf>,
}

impl LoadReport {
    /// Whether the synthetic generator produced the dataset.
    pub fn used_fallback(&self) -> bool {
        self.states.contains(&LoadState::GenerateSynthetic)
    }
}

/// Mutable bookkeeping for one load.
#[derive(Default)]
struct Trace {
    states: Vec<LoadState>,
    diagnostics: Vec<PipelineError>,
}

impl Trace {
    fn enter(&mut self, state: LoadState) {
        debug!(%state, "loader state");
        self.states.push(state);
    }

    fn diagnose(&mut self, error: PipelineError) {
        warn!(%error, "recovered");
        self.diagnostics.push(error);
    }

    fn finish(mut self, dataset: Dataset, cache_hit: Option<PathBuf>) -> LoadReport {
        self.enter(LoadState::Ready);
        info!(
            features = dataset.len(),
            villages = dataset.metadata().total_count,
            source = ?dataset.source(),
            diagnostics = self.diagnostics.len(),
            "dataset ready"
        );
        LoadReport { dataset, states: self.states, diagnostics: self.diagnostics, cache_hit }
    }
}

/// Builds a [`Dataset`] from the configured sources.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    config: PipelineConfig,
    table: AliasTable,
}

impl DatasetLoader {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, table: AliasTable::default() }
    }

    /// Use a custom schema table instead of the census one.
    pub fn with_alias_table(mut self, table: AliasTable) -> Self {
        self.table = table;
        self
    }

    #[inline] pub fn config(&self) -> &PipelineConfig { &self.config }

    /// Run the state machine to `Ready`.
    ///
    /// Only fails with [`PipelineError::FallbackFailed`], when even the
    /// synthetic dataset cannot be built.
    pub fn load(&self) -> Result<LoadReport> {
        self.run(true)
    }

    /// Like [`load`](Self::load) but never reads a snapshot, so the dataset
    /// is rebuilt from the configured source. A successful authoritative
    /// build still replaces the snapshots.
    pub fn load_fresh(&self) -> Result<LoadReport> {
        self.run(false)
    }

    fn run(&self, read_cache: bool) -> Result<LoadReport> {
        let mut trace = Trace::default();

        if read_cache {
            if let Some((dataset, path)) = self.try_cache(&mut trace) {
                return Ok(trace.finish(dataset, Some(path)));
            }
        }

        trace.enter(LoadState::AttemptAuthoritative);
        let path = &self.config.shapefile;
        let attempt = ShapefileSource::open(path)
            .and_then(|mut source| { source.reproject()?; Ok(source) })
            .and_then(|source| self.build_authoritative(source, &mut trace));

        match attempt {
            Ok(dataset) => {
                self.write_cache(&dataset, &mut trace);
                Ok(trace.finish(dataset, None))
            }
            Err(e) => {
                trace.diagnose(PipelineError::SourceUnavailable { path: path.clone(), reason: format!("{e:#}") });
                let dataset = self.build_synthetic(&mut trace)
                    .map_err(|e| PipelineError::FallbackFailed(format!("{e:#}")))?;
                Ok(trace.finish(dataset, None))
            }
        }
    }

    fn try_cache(&self, trace: &mut Trace) -> Option<(Dataset, PathBuf)> {
        let dir = self.config.cache_dir.as_ref().filter(|_| self.config.use_cache)?;
        trace.enter(LoadState::ReadCache);
        match read_snapshot(dir) {
            Ok(Some((snapshot, path))) => {
                info!(path = %path.display(), format = %snapshot.data_format, "cache hit");
                Some((snapshot.dataset, path))
            }
            Ok(None) => {
                debug!(dir = %dir.display(), "cache miss");
                None
            }
            Err(e) => {
                trace.diagnose(PipelineError::Snapshot(format!("{e:#}")));
                None
            }
        }
    }

    fn write_cache(&self, dataset: &Dataset, trace: &mut Trace) {
        let Some(dir) = self.config.cache_dir.as_ref().filter(|_| self.config.write_cache) else { return };
        if let Err(e) = write_snapshots(dataset, dir, self.config.minimal_count) {
            trace.diagnose(PipelineError::Snapshot(format!("{e:#}")));
        }
    }

    /// RECONCILE → SIMPLIFY → STATS over a shapefile that opened cleanly.
    fn build_authoritative(&self, mut source: ShapefileSource, trace: &mut Trace) -> anyhow::Result<Dataset> {
        trace.enter(LoadState::Reconcile);
        let reconciled = source.reconcile_schema(&self.table, &self.config.state_name)?;
        if !reconciled.reconciliation.unmapped.is_empty() {
            trace.diagnose(PipelineError::SchemaMismatch { missing: reconciled.reconciliation.unmapped.clone() });
        }
        for field in &reconciled.reconciliation.by_keyword {
            let column = reconciled.reconciliation.source_for(field).unwrap_or_default();
            info!(field = %field, column, "matched by keyword");
        }
        for (row, raw) in &reconciled.coercion.malformed {
            trace.diagnose(PipelineError::MalformedPopulation { row: *row, raw: raw.clone() });
        }

        trace.enter(LoadState::Simplify);
        let reduction = source.simplify(self.config.simplify_tolerance);
        info!(
            before = reduction.before,
            after = reduction.after,
            reduced = %format!("{:.1}%", reduction.percent()),
            "simplified geometries"
        );

        trace.enter(LoadState::Stats);
        let features = source.features(reconciled.coercion)?;
        self.finish_stats(Dataset::new(features, source.origin())?, trace)
    }

    /// GENERATE_SYNTHETIC → STATS.
    fn build_synthetic(&self, trace: &mut Trace) -> anyhow::Result<Dataset> {
        trace.enter(LoadState::GenerateSynthetic);
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let source = SyntheticSource::generate(
            self.config.synthetic_count(),
            self.config.include_state_boundary,
            &self.config.state_name,
            &mut rng,
        );
        info!(villages = self.config.synthetic_count(), seed = ?self.config.seed, "generated synthetic villages");

        trace.enter(LoadState::Stats);
        let normalized = source.normalize(&self.table, &self.config.state_name)?;
        let dataset = Dataset::new(normalized.features, source.origin())
            .context("Synthetic features failed validation")?;
        self.finish_stats(dataset, trace)
    }

    fn finish_stats(&self, dataset: Dataset, trace: &mut Trace) -> anyhow::Result<Dataset> {
        if dataset.used_sentinel_stats() {
            trace.diagnose(PipelineError::EmptyStatistics);
        }
        let stats = dataset.stats();
        info!(
            min = stats.min, max = stats.max, mean = stats.mean, median = stats.median,
            total = dataset.metadata().total_population,
            "population statistics"
        );
        Ok(dataset)
    }
}
