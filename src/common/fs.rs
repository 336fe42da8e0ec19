use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};

/// Shapefile components that may ship gzipped next to the `.shp`.
const SHAPEFILE_PARTS: [&str; 5] = ["shp", "shx", "dbf", "prj", "cpg"];

/// Make sure the snapshot directory `dir` exists. Returns whether it had to be created.
pub fn ensure_dir(dir: &Path) -> Result<bool> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => anyhow::bail!("{} exists but is a file", dir.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create snapshot directory {}", dir.display()))?;
            Ok(true)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to inspect {}", dir.display())),
    }
}

/// `path` with `.gz` appended to its full file name.
fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Decompress `gz` into `dest`, streaming.
pub fn gunzip_file(gz: &Path, dest: &Path) -> Result<()> {
    let input = File::open(gz)
        .with_context(|| format!("Failed to open {}", gz.display()))?;
    let mut decoder = GzDecoder::new(BufReader::new(input));
    let mut output = BufWriter::new(File::create(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?);
    io::copy(&mut decoder, &mut output)
        .with_context(|| format!("Failed to decompress {}", gz.display()))?;
    output.flush()?;
    Ok(())
}

/// Make sure `<stem>.shp` and its sidecars exist, gunzipping any `<part>.gz`
/// siblings when the `.shp` itself is missing. Returns the parts extracted.
pub fn restore_compressed_shapefile(shp: &Path) -> Result<Vec<PathBuf>> {
    if shp.exists() { return Ok(Vec::new()) }

    let main_gz = gz_path(shp);
    if !main_gz.exists() {
        anyhow::bail!("Neither {} nor {} exists", shp.display(), main_gz.display());
    }

    let mut extracted = Vec::new();
    for ext in SHAPEFILE_PARTS {
        let part = shp.with_extension(ext);
        let gz = gz_path(&part);
        if !part.exists() && gz.exists() {
            gunzip_file(&gz, &part)?;
            extracted.push(part);
        }
    }
    Ok(extracted)
}

/// Gzip a byte buffer.
pub fn gzip_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).context("Failed to gzip bytes")?;
    encoder.finish().context("Failed to finish gzip stream")
}

/// Inflate a gzip byte buffer.
pub fn gunzip_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out).context("Failed to inflate gzip bytes")?;
    Ok(out)
}
