//! Mock downloader for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::Backend;
use crate::fetcher::{AudioDownloader, DownloadError, DownloadRequest};

/// Mock implementation of the AudioDownloader trait.
///
/// Every download writes `<output_dir>/<id>.<ext>` containing `audio:<id>`
/// unless the id was configured to fail, produce nothing, or produce an
/// empty file.
#[derive(Debug)]
pub struct MockDownloader {
    /// Recorded requests, failures included.
    downloads: Arc<RwLock<Vec<DownloadRequest>>>,
    /// Ids whose download returns an error.
    failing: Arc<RwLock<HashSet<String>>>,
    /// Ids whose download succeeds without writing a file.
    silent: Arc<RwLock<HashSet<String>>>,
    /// Ids whose download writes an empty file.
    empty: Arc<RwLock<HashSet<String>>>,
    /// Extension of written files.
    extension: Arc<RwLock<String>>,
}

impl Default for MockDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDownloader {
    /// Create a mock downloader where every download succeeds.
    pub fn new() -> Self {
        Self {
            downloads: Arc::new(RwLock::new(Vec::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            silent: Arc::new(RwLock::new(HashSet::new())),
            empty: Arc::new(RwLock::new(HashSet::new())),
            extension: Arc::new(RwLock::new("mp3".to_string())),
        }
    }

    /// Make downloads of `source_id` fail.
    pub async fn fail_for(&self, source_id: &str) {
        self.failing.write().await.insert(source_id.to_string());
    }

    /// Make downloads of `source_id` succeed without producing a file.
    pub async fn no_output_for(&self, source_id: &str) {
        self.silent.write().await.insert(source_id.to_string());
    }

    /// Make downloads of `source_id` produce an empty file.
    pub async fn empty_output_for(&self, source_id: &str) {
        self.empty.write().await.insert(source_id.to_string());
    }

    /// Set the extension of produced files.
    pub async fn set_extension(&self, extension: &str) {
        *self.extension.write().await = extension.to_string();
    }

    /// Get recorded download requests.
    pub async fn recorded_downloads(&self) -> Vec<DownloadRequest> {
        self.downloads.read().await.clone()
    }
}

#[async_trait]
impl AudioDownloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(
        &self,
        _backend: &Backend,
        request: &DownloadRequest,
    ) -> Result<(), DownloadError> {
        self.downloads.write().await.push(request.clone());
        let id = request.source_id.as_str();

        if self.failing.read().await.contains(id) {
            return Err(DownloadError::Failed {
                reason: format!("ERROR: [youtube] {}: Video unavailable", id),
                stderr: None,
            });
        }
        if self.silent.read().await.contains(id) {
            return Ok(());
        }

        let contents = if self.empty.read().await.contains(id) {
            Vec::new()
        } else {
            format!("audio:{}", id).into_bytes()
        };
        let extension = self.extension.read().await.clone();
        tokio::fs::create_dir_all(&request.output_dir).await?;
        tokio::fs::write(
            request.output_dir.join(format!("{}.{}", id, extension)),
            contents,
        )
        .await?;
        Ok(())
    }
}
