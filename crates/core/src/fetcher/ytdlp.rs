//! yt-dlp download backend.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::types::{AudioDownloader, DownloadError, DownloadRequest};
use crate::backend::Backend;
use crate::config::DownloadConfig;

/// Downloads a single video with yt-dlp and extracts its audio track.
pub struct YtDlpDownloader {
    ytdlp_path: PathBuf,
    config: DownloadConfig,
}

impl YtDlpDownloader {
    pub fn new(ytdlp_path: impl Into<PathBuf>, config: DownloadConfig) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            config,
        }
    }

    fn build_args(&self, backend: &Backend, request: &DownloadRequest) -> Vec<String> {
        vec![
            "-f".to_string(),
            self.config.format.clone(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "--audio-quality".to_string(),
            format!("{}K", self.config.audio_quality_kbps),
            "--no-playlist".to_string(),
            "--retries".to_string(),
            self.config.network_retries.to_string(),
            "--ffmpeg-location".to_string(),
            backend.ffmpeg_path().to_string_lossy().to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--no-progress".to_string(),
            "-o".to_string(),
            request.output_template().to_string_lossy().to_string(),
            // URLs never parse as options
            "--".to_string(),
            request.url.clone(),
        ]
    }
}

#[async_trait]
impl AudioDownloader for YtDlpDownloader {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn download(
        &self,
        backend: &Backend,
        request: &DownloadRequest,
    ) -> Result<(), DownloadError> {
        let args = self.build_args(backend, request);
        debug!("Running {:?} {:?}", self.ytdlp_path, args);

        let child = backend
            .command(&self.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DownloadError::ToolNotFound {
                        path: self.ytdlp_path.clone(),
                    }
                } else {
                    DownloadError::Io(e)
                }
            })?;

        let timeout_secs = self.config.timeout_secs;
        let output = timeout(Duration::from_secs(timeout_secs), child.wait_with_output())
            .await
            .map_err(|_| DownloadError::Timeout { timeout_secs })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("yt-dlp exited with code: {:?}", output.status.code()));
            return Err(DownloadError::Failed {
                reason,
                stderr: (!stderr.is_empty()).then_some(stderr),
            });
        }

        Ok(())
    }
}
