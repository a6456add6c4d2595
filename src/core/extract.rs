use crate::error::{FetchError, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn part_path(output_path: &Path) -> PathBuf {
    let mut name = output_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Decompresses `gz_path` into `output_path` and removes `gz_path`.
///
/// The archive is left untouched unless the whole stream decoded and the
/// output was moved into place. Returns the size of the extracted file.
pub fn extract_gz(gz_path: &Path, output_path: &Path) -> Result<u64> {
    let staging = part_path(output_path);
    debug!(
        "Extracting {} to {}",
        gz_path.display(),
        staging.display()
    );

    if let Err(e) = decode_into(gz_path, &staging) {
        let _ = std::fs::remove_file(&staging);
        return Err(FetchError::decompression(gz_path, e));
    }

    std::fs::rename(&staging, output_path)
        .map_err(|e| FetchError::decompression(output_path, e))?;
    std::fs::remove_file(gz_path).map_err(|e| FetchError::decompression(gz_path, e))?;

    let size = std::fs::metadata(output_path)
        .map_err(|e| FetchError::decompression(output_path, e))?
        .len();
    let name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!("Extracted: {name} ({:.1} MB)", crate::utils::fs::size_in_mb(size));
    Ok(size)
}

fn decode_into(gz_path: &Path, target: &Path) -> std::io::Result<()> {
    let input = File::open(gz_path)?;
    let mut decoder = MultiGzDecoder::new(BufReader::new(input));
    let mut output = BufWriter::new(File::create(target)?);
    std::io::copy(&mut decoder, &mut output)?;
    output.flush()?;
    output.get_ref().sync_all()?;
    Ok(())
}

/// Runs [`extract_gz`] on the blocking pool.
pub async fn extract_gz_blocking(gz_path: PathBuf, output_path: PathBuf) -> Result<u64> {
    let path = gz_path.clone();
    tokio::task::spawn_blocking(move || extract_gz(&gz_path, &output_path))
        .await
        .map_err(|e| FetchError::decompression(path, std::io::Error::other(e)))?
}
