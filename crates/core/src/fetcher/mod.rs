//! Audio fetching.
//!
//! Walks discovered candidates in rank order, downloads each through an
//! [`AudioDownloader`], and accepts the result only once its size has
//! stopped changing. Individual failures are skipped; only falling short
//! of the target fails the run.

mod types;
mod ytdlp;

pub use types::*;
pub use ytdlp::YtDlpDownloader;

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::MashupError;
use crate::retry::RetryPolicy;
use crate::searcher::Candidate;

/// Downloads candidates until enough stable files exist.
pub struct AudioFetcher {
    downloader: Arc<dyn AudioDownloader>,
    stability: RetryPolicy,
    audio_extension: String,
}

impl AudioFetcher {
    pub fn new(downloader: Arc<dyn AudioDownloader>, stability: RetryPolicy) -> Self {
        Self {
            downloader,
            stability,
            audio_extension: "mp3".to_string(),
        }
    }

    /// Sets the extension preferred when locating a download's output.
    pub fn with_audio_extension(mut self, extension: impl Into<String>) -> Self {
        self.audio_extension = extension.into();
        self
    }

    /// Fetches up to `target` files into `downloads_dir`, in candidate order.
    ///
    /// Never returns more than `target` files; returns
    /// [`MashupError::InsufficientDownloads`] instead of fewer.
    pub async fn fetch(
        &self,
        backend: &Backend,
        candidates: &[Candidate],
        target: usize,
        downloads_dir: &Path,
    ) -> Result<Vec<FetchedFile>, MashupError> {
        tokio::fs::create_dir_all(downloads_dir).await?;

        let mut fetched = Vec::with_capacity(target);
        let mut attempted = 0usize;

        for candidate in candidates {
            if fetched.len() >= target {
                break;
            }
            attempted += 1;

            match self.fetch_one(backend, candidate, downloads_dir).await {
                Ok(file) => {
                    debug!(
                        source_id = %file.source_id,
                        size_bytes = file.size_bytes,
                        "Fetched {:?}",
                        file.local_path
                    );
                    fetched.push(file);
                }
                Err(skip) => {
                    warn!(
                        rank = candidate.rank,
                        url = candidate.source_url.as_deref().unwrap_or("-"),
                        "Skipping candidate: {}",
                        skip
                    );
                }
            }
        }

        info!(
            fetched = fetched.len(),
            attempted,
            target,
            "Fetch stage finished"
        );

        if fetched.len() < target {
            return Err(MashupError::InsufficientDownloads {
                obtained: fetched.len(),
                requested: target,
            });
        }
        Ok(fetched)
    }

    /// Downloads one candidate and waits for its file to settle.
    pub async fn fetch_one(
        &self,
        backend: &Backend,
        candidate: &Candidate,
        downloads_dir: &Path,
    ) -> Result<FetchedFile, FetchSkip> {
        let (Some(url), Some(source_id)) = (
            non_blank(candidate.source_url.as_deref()),
            non_blank(candidate.source_id.as_deref()),
        ) else {
            return Err(FetchSkip::MissingSource);
        };

        let request = DownloadRequest {
            url: url.to_string(),
            source_id: source_id.to_string(),
            output_dir: downloads_dir.to_path_buf(),
        };
        self.downloader.download(backend, &request).await?;

        let path = locate_output(downloads_dir, source_id, &self.audio_extension)
            .await
            .ok_or_else(|| FetchSkip::OutputMissing {
                source_id: source_id.to_string(),
            })?;

        let size_bytes = self
            .wait_until_stable(&path)
            .await
            .ok_or_else(|| FetchSkip::Unstable { path: path.clone() })?;

        Ok(FetchedFile {
            source_id: source_id.to_string(),
            local_path: path,
            size_bytes,
        })
    }

    /// Polls the file size until two consecutive observations agree and are
    /// nonzero. A missing file counts as not yet ready.
    async fn wait_until_stable(&self, path: &Path) -> Option<u64> {
        // 0 until a nonzero size has been seen
        let last_size = AtomicU64::new(0);
        let last_size = &last_size;
        let Ok(stable) = self
            .stability
            .poll(move || async move {
                let Ok(metadata) = tokio::fs::metadata(path).await else {
                    return Ok::<_, Infallible>(None);
                };
                let size = metadata.len();
                if size > 0 && last_size.swap(size, Ordering::SeqCst) == size {
                    return Ok(Some(size));
                }
                Ok(None)
            })
            .await;
        stable
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Finds the file produced for `source_id`: `<id>.<extension>` when present,
/// otherwise the first `<id>.*` in name order.
pub async fn locate_output(dir: &Path, source_id: &str, extension: &str) -> Option<PathBuf> {
    let preferred = dir.join(format!("{}.{}", source_id, extension));
    if tokio::fs::metadata(&preferred).await.is_ok() {
        return Some(preferred);
    }

    let prefix = format!("{}.", source_id);
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut matches = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    matches.into_iter().next()
}
