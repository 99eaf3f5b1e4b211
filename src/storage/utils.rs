use crate::application::models::record::PostRecord;
use crate::constants::{DEFAULT_PHOTO_EXTENSION, WORD_CLOUD_FILE_SUFFIX};
use crate::error::AppError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `<output_dir>/<username>/<post_id>_<index>.<ext>`
pub fn photo_path(
    output_dir: &Path,
    username: &str,
    post_id: &str,
    index: usize,
    extension: &str,
) -> PathBuf {
    output_dir
        .join(username)
        .join(format!("{}_{}.{}", post_id, index, extension))
}

/// `<output_dir>/<username>_ht_word_cloud.png`
pub fn word_cloud_path(output_dir: &Path, username: &str) -> PathBuf {
    output_dir.join(format!("{}{}", username, WORD_CLOUD_FILE_SUFFIX))
}

/// Image extension taken from the URL path, ignoring the query string.
pub fn extension_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let file_name = path.rsplit('/').next().unwrap_or_default();
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 4
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_PHOTO_EXTENSION.to_string(),
    }
}

/// Writes `bytes` to `path`, creating missing parent directories.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Writes the post table as CSV with a header row. Returns the number of rows.
pub fn export_records_csv(path: &Path, records: &[PostRecord]) -> Result<usize, AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    debug!("Exported {} records to {}", records.len(), path.display());
    Ok(records.len())
}
