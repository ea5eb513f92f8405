//! Mashup orchestrator implementation.
//!
//! Runs one request end to end, strictly sequentially:
//! locate backend, create workspace, discover, fetch, trim, merge.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::assembler;
use crate::backend::{BackendLocator, FfmpegLocator};
use crate::config::{Config, SearchConfig};
use crate::error::MashupError;
use crate::fetcher::{AudioDownloader, AudioFetcher, YtDlpDownloader};
use crate::request::MashupRequest;
use crate::searcher::{self, VideoSearcher, YtDlpSearcher};
use crate::transcoder::{FfmpegTranscoder, Transcoder};
use crate::trimmer::ClipTrimmer;
use crate::workspace::Workspace;

/// Anything that can turn a validated request into a mashup file.
#[async_trait]
pub trait MashupRunner: Send + Sync {
    /// Runs the whole pipeline and returns the output path.
    async fn run(&self, request: &MashupRequest) -> Result<PathBuf, MashupError>;
}

/// The production pipeline.
pub struct MashupOrchestrator {
    locator: Arc<dyn BackendLocator>,
    searcher: Arc<dyn VideoSearcher>,
    transcoder: Arc<dyn Transcoder>,
    fetcher: AudioFetcher,
    trimmer: ClipTrimmer,
    search_config: SearchConfig,
    workspace_root: Option<PathBuf>,
    settle_delay: Duration,
}

impl MashupOrchestrator {
    /// Builds an orchestrator around the given collaborators.
    pub fn new(
        config: &Config,
        locator: Arc<dyn BackendLocator>,
        searcher: Arc<dyn VideoSearcher>,
        downloader: Arc<dyn AudioDownloader>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let fetcher = AudioFetcher::new(downloader, config.stability.policy())
            .with_audio_extension(config.download.audio_format.clone());
        let trimmer = ClipTrimmer::new(
            Arc::clone(&transcoder),
            config.lock_wait.policy(),
            &config.transcoder,
        );

        Self {
            locator,
            searcher,
            transcoder,
            fetcher,
            trimmer,
            search_config: config.search.clone(),
            workspace_root: config.workspace.root.clone(),
            settle_delay: Duration::from_millis(config.pipeline.settle_delay_ms),
        }
    }

    /// Builds the yt-dlp + ffmpeg pipeline described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let locator = Arc::new(FfmpegLocator::new(config.transcoder.clone()));
        let searcher = Arc::new(YtDlpSearcher::new(&config.search));
        let downloader = Arc::new(YtDlpDownloader::new(
            config.search.ytdlp_path.clone(),
            config.download.clone(),
        ));
        let transcoder = Arc::new(FfmpegTranscoder::new(&config.transcoder));
        Self::new(config, locator, searcher, downloader, transcoder)
    }

    /// Overrides where run workspaces are created.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    async fn execute(&self, request: &MashupRequest) -> Result<PathBuf, MashupError> {
        let started = Instant::now();
        info!(
            video_count = request.video_count(),
            clip_seconds = request.clip_seconds(),
            output = ?request.output_path(),
            "Starting mashup run"
        );

        let backend = self.locator.locate().await?;

        let workspace = Workspace::create(self.workspace_root.as_deref())?;
        info!("Working in {:?}", workspace.path());

        let candidates = searcher::discover(
            self.searcher.as_ref(),
            &self.search_config,
            request.singer(),
            request.video_count(),
        )
        .await?;

        let files = self
            .fetcher
            .fetch(
                &backend,
                &candidates,
                request.video_count() as usize,
                &workspace.downloads_dir(),
            )
            .await?;

        if !self.settle_delay.is_zero() {
            info!("Settling for {:?} before trimming", self.settle_delay);
            tokio::time::sleep(self.settle_delay).await;
        }

        let clips = self
            .trimmer
            .trim(
                &backend,
                &files,
                request.clip_seconds(),
                &workspace.trimmed_dir(),
            )
            .await?;

        let output = assembler::merge(
            self.transcoder.as_ref(),
            &backend,
            &clips,
            request.output_path(),
        )
        .await?;

        if let Err(e) = workspace.close() {
            warn!("Failed to remove workspace: {}", e);
        }

        info!(
            clips = clips.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Mashup created at {:?}",
            output
        );
        Ok(output)
    }
}

#[async_trait]
impl MashupRunner for MashupOrchestrator {
    async fn run(&self, request: &MashupRequest) -> Result<PathBuf, MashupError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("mashup", %run_id, singer = %request.singer());

        async {
            let result = self.execute(request).await;
            if let Err(e) = &result {
                warn!(kind = e.kind(), "Mashup run failed: {}", e);
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockDownloader, MockLocator, MockSearcher, MockTranscoder};
    use tempfile::TempDir;

    struct Harness {
        locator: Arc<MockLocator>,
        searcher: Arc<MockSearcher>,
        downloader: Arc<MockDownloader>,
        transcoder: Arc<MockTranscoder>,
        root: TempDir,
    }

    impl Harness {
        fn new(candidates: usize) -> Self {
            Self {
                locator: Arc::new(MockLocator::new()),
                searcher: Arc::new(MockSearcher::with_results(fixtures::search_entries(
                    candidates,
                ))),
                downloader: Arc::new(MockDownloader::new()),
                transcoder: Arc::new(MockTranscoder::new()),
                root: TempDir::new().unwrap(),
            }
        }

        fn orchestrator(&self, config: &Config) -> MashupOrchestrator {
            MashupOrchestrator::new(
                config,
                self.locator.clone(),
                self.searcher.clone(),
                self.downloader.clone(),
                self.transcoder.clone(),
            )
            .with_workspace_root(self.root.path().join("work"))
        }

        fn workspace_entries(&self) -> usize {
            std::fs::read_dir(self.root.path().join("work"))
                .map(|d| d.count())
                .unwrap_or(0)
        }
    }

    fn request(root: &Path) -> MashupRequest {
        MashupRequest::new("Test Singer", 11, 21, root.join("out")).unwrap()
    }

    #[tokio::test]
    async fn test_run_produces_output() {
        let h = Harness::new(30);
        let config = fixtures::fast_config();
        let req = request(h.root.path());

        let output = h.orchestrator(&config).run(&req).await.unwrap();

        assert_eq!(output, h.root.path().join("out.mp3"));
        assert!(output.is_file());
        assert_eq!(h.transcoder.recorded_trims().await.len(), 11);
        assert_eq!(h.transcoder.recorded_concats().await.len(), 1);
        assert_eq!(h.workspace_entries(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_stops_before_search() {
        let h = Harness::new(30);
        h.locator.set_unavailable("no ffmpeg build").await;
        let req = request(h.root.path());

        let err = h
            .orchestrator(&fixtures::fast_config())
            .run(&req)
            .await
            .unwrap_err();

        assert!(matches!(err, MashupError::BackendUnavailable(_)));
        assert_eq!(h.searcher.search_count().await, 0);
        assert_eq!(h.workspace_entries(), 0);
    }

    #[tokio::test]
    async fn test_settle_delay_is_applied() {
        let h = Harness::new(30);
        let mut config = fixtures::fast_config();
        config.pipeline.settle_delay_ms = 5;
        let req = request(h.root.path());

        let started = Instant::now();
        h.orchestrator(&config).run(&req).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(5));
    }
}
