//! Types for the audio fetcher.

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::backend::Backend;

/// One download+extract invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub source_id: String,
    /// Directory the extracted file is written to.
    pub output_dir: PathBuf,
}

impl DownloadRequest {
    /// Output template handed to the downloader: `<dir>/<id>.%(ext)s`.
    pub fn output_template(&self) -> PathBuf {
        self.output_dir.join(format!("{}.%(ext)s", self.source_id))
    }
}

/// Errors from a single download.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download tool not found at {path}")]
    ToolNotFound { path: PathBuf },

    #[error("download timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("download failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A downloaded file whose size stopped changing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedFile {
    pub source_id: String,
    pub local_path: PathBuf,
    pub size_bytes: u64,
}

/// Why a candidate produced no [`FetchedFile`].
#[derive(Debug, Error)]
pub enum FetchSkip {
    #[error("candidate has no URL or ID")]
    MissingSource,

    #[error(transparent)]
    DownloadFailed(#[from] DownloadError),

    #[error("no output file found for {source_id}")]
    OutputMissing { source_id: String },

    #[error("file did not stabilize: {path}")]
    Unstable { path: PathBuf },
}

/// Something that can download a URL and extract its audio.
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    /// Returns the name of this downloader implementation.
    fn name(&self) -> &str;

    /// Downloads `request.url` into `request.output_dir` using the
    /// `<id>.<ext>` naming scheme. Subprocesses run with `backend`'s search
    /// path and ffmpeg location.
    async fn download(
        &self,
        backend: &Backend,
        request: &DownloadRequest,
    ) -> Result<(), DownloadError>;
}
