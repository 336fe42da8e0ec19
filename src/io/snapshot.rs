use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{
    common::{ensure_dir, gunzip_bytes, gzip_bytes},
    dataset::Dataset,
    io::{from_feature_collection, to_feature_collection},
};

pub const GZIP_SNAPSHOT: &str = "deployable_data.json.gz";
pub const JSON_SNAPSHOT: &str = "deployable_data.json";
pub const MINIMAL_SNAPSHOT: &str = "deployable_data_minimal.json";

/// Gzip stream magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// How a dataset is packed for transport or caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Indented JSON, for development.
    Json,
    /// Compact JSON, gzip-compressed.
    Gzip,
    /// Compact JSON of the first `n` features only.
    Minimal(usize),
}

impl Encoding {
    /// Value of `metadata.data_format` for this encoding.
    pub fn data_format(&self) -> &'static str {
        match self {
            Encoding::Json => "deployable",
            Encoding::Gzip => "deployable_compressed",
            Encoding::Minimal(_) => "deployable_minimal",
        }
    }

    /// File name used for this encoding in a snapshot directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Encoding::Json => JSON_SNAPSHOT,
            Encoding::Gzip => GZIP_SNAPSHOT,
            Encoding::Minimal(_) => MINIMAL_SNAPSHOT,
        }
    }
}

/// A dataset decoded from a snapshot, with the format it was stored as.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub dataset: Dataset,
    pub data_format: String,
}

/// Serialize `dataset` with the given encoding.
pub fn encode(dataset: &Dataset, encoding: Encoding) -> Result<Vec<u8>> {
    let truncated;
    let dataset = match encoding {
        Encoding::Minimal(n) => { truncated = dataset.truncated(n)?; &truncated }
        _ => dataset,
    };

    let payload = to_feature_collection(dataset, encoding.data_format())?;
    match encoding {
        Encoding::Json => serde_json::to_vec_pretty(&payload).context("Failed to serialize dataset"),
        Encoding::Gzip => gzip_bytes(&serde_json::to_vec(&payload).context("Failed to serialize dataset")?),
        Encoding::Minimal(_) => serde_json::to_vec(&payload).context("Failed to serialize dataset"),
    }
}

/// Decode bytes written by [`encode`]; gzip input is detected by its header.
pub fn decode(bytes: &[u8]) -> Result<Snapshot> {
    let inflated;
    let json = if bytes.starts_with(&GZIP_MAGIC) {
        inflated = gunzip_bytes(bytes)?;
        &inflated[..]
    } else {
        bytes
    };

    let value: serde_json::Value = serde_json::from_slice(json).context("Failed to parse snapshot JSON")?;
    let (dataset, data_format) = from_feature_collection(&value)?;
    Ok(Snapshot { dataset, data_format })
}

/// Write-then-rename so readers never observe a half-written snapshot.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let parent = target.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if ensure_dir(parent)? {
        debug!(dir = %parent.display(), "created snapshot directory");
    }

    let mut tmp = NamedTempFile::new_in(parent).context("create temp file")?;
    tmp.write_all(bytes).with_context(|| format!("write {}", target.display()))?;
    tmp.as_file().sync_all().ok(); // best-effort fsync file
    tmp.persist(target)
        .with_context(|| format!("rename to {}", target.display()))?;
    let _ = File::open(parent).and_then(|f| f.sync_all());
    Ok(())
}

/// Write the gzip, pretty and minimal snapshots into `dir`.
pub fn write_snapshots(dataset: &Dataset, dir: &Path, minimal_count: usize) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(3);
    for encoding in [Encoding::Gzip, Encoding::Json, Encoding::Minimal(minimal_count)] {
        let path = dir.join(encoding.file_name());
        let bytes = encode(dataset, encoding)?;
        write_atomic(&path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote snapshot");
        written.push(path);
    }
    info!(dir = %dir.display(), features = dataset.len(), "snapshots written");
    Ok(written)
}

/// Read the first snapshot present in `dir`: gzip, then full JSON, then minimal.
/// `Ok(None)` when there is none.
pub fn read_snapshot(dir: &Path) -> Result<Option<(Snapshot, PathBuf)>> {
    for name in [GZIP_SNAPSHOT, JSON_SNAPSHOT, MINIMAL_SNAPSHOT] {
        let path = dir.join(name);
        if !path.exists() { continue }

        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        let snapshot = decode(&bytes)
            .with_context(|| format!("Failed to decode snapshot: {}", path.display()))?;
        return Ok(Some((snapshot, path)));
    }
    Ok(None)
}
