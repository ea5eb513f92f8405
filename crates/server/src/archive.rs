//! Zip packaging of the finished mashup.

use std::io::{Cursor, Write};
use std::path::Path;

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the mashup inside the archive.
pub const ARCHIVE_ENTRY: &str = "mashup.mp3";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to read mashup: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to build zip: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Builds an in-memory deflated zip holding `path` as `entry_name`.
pub async fn zip_file(path: &Path, entry_name: &str) -> Result<Vec<u8>, ArchiveError> {
    let contents = tokio::fs::read(path).await?;
    zip_bytes(&contents, entry_name)
}

pub fn zip_bytes(contents: &[u8], entry_name: &str) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file(entry_name, options)?;
    writer.write_all(contents)?;
    Ok(writer.finish()?.into_inner())
}
