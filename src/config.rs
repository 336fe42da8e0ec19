use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Fewest and most villages the synthetic generator will produce.
pub const SYNTHETIC_RANGE: (usize, usize) = (80, 100);

/// Settings for one run of the dataset pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Path to the authoritative `.shp` file.
    pub shapefile: PathBuf,
    /// Directory holding snapshot files; `None` disables the cache entirely.
    pub cache_dir: Option<PathBuf>,
    /// Read an existing snapshot before parsing the shapefile.
    pub use_cache: bool,
    /// Write snapshots after a successful authoritative load.
    pub write_cache: bool,
    /// Simplification tolerance in coordinate degrees.
    pub simplify_tolerance: f64,
    pub synthetic_villages: usize,
    pub include_state_boundary: bool,
    /// Seed for the synthetic generator. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Number of features kept in the minimal snapshot.
    pub minimal_count: usize,
    /// State name used when the source has no state column.
    pub state_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shapefile: PathBuf::from("Karnataka.shp"),
            cache_dir: None,
            use_cache: true,
            write_cache: true,
            simplify_tolerance: 0.0001,
            synthetic_villages: SYNTHETIC_RANGE.0,
            include_state_boundary: true,
            seed: None,
            minimal_count: 100,
            state_name: "Karnataka".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Read a config from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Apply `VILLAGEMAP_SHAPEFILE`, `VILLAGEMAP_CACHE_DIR` and `VILLAGEMAP_SEED`.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply the `VILLAGEMAP_*` overrides found by `lookup`.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = lookup("VILLAGEMAP_SHAPEFILE") {
            self.shapefile = PathBuf::from(path);
        }
        if let Some(dir) = lookup("VILLAGEMAP_CACHE_DIR") {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(seed) = lookup("VILLAGEMAP_SEED") {
            self.seed = Some(seed.trim().parse()
                .with_context(|| format!("VILLAGEMAP_SEED is not an integer: {seed:?}"))?);
        }
        Ok(self)
    }

    /// Synthetic village count clamped into the supported range.
    pub fn synthetic_count(&self) -> usize {
        self.synthetic_villages.clamp(SYNTHETIC_RANGE.0, SYNTHETIC_RANGE.1)
    }

    pub fn with_shapefile(mut self, path: impl Into<PathBuf>) -> Self {
        self.shapefile = path.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
