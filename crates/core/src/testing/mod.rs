//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every collaborator the
//! pipeline talks to, so stages and front ends can be tested without yt-dlp,
//! ffmpeg or the network.
//!
//! # Example
//!
//! ```rust,ignore
//! use mashup_core::testing::{fixtures, MockDownloader, MockLocator, MockSearcher, MockTranscoder};
//!
//! let searcher = Arc::new(MockSearcher::with_results(fixtures::search_entries(30)));
//! let downloader = Arc::new(MockDownloader::new());
//! downloader.fail_for("vid03").await;
//!
//! let orchestrator = MashupOrchestrator::new(
//!     &fixtures::fast_config(),
//!     Arc::new(MockLocator::new()),
//!     searcher,
//!     downloader,
//!     Arc::new(MockTranscoder::new()),
//! );
//! ```

mod mock_downloader;
mod mock_locator;
mod mock_runner;
mod mock_searcher;
mod mock_transcoder;

pub use mock_downloader::MockDownloader;
pub use mock_locator::MockLocator;
pub use mock_runner::MockRunner;
pub use mock_searcher::{MockSearcher, RecordedSearch};
pub use mock_transcoder::{parse_manifest, MockTranscoder};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::backend::Backend;
    use crate::config::{Config, PollConfig};
    use crate::fetcher::FetchedFile;
    use crate::searcher::{Candidate, SearchEntry};
    use crate::trimmer::TrimmedClip;

    /// A backend pointing at a conventional ffmpeg location.
    pub fn backend() -> Backend {
        Backend::new("/usr/bin/ffmpeg", None)
    }

    /// Id of the `index`-th generated video.
    pub fn video_id(index: usize) -> String {
        format!("vid{:02}", index)
    }

    /// A complete search entry for `id`.
    pub fn search_entry(id: &str) -> SearchEntry {
        SearchEntry {
            id: Some(id.to_string()),
            url: Some(format!("https://www.youtube.com/watch?v={}", id)),
            title: Some(format!("Song {}", id)),
        }
    }

    /// `count` complete search entries, `vid00`, `vid01`, ...
    pub fn search_entries(count: usize) -> Vec<SearchEntry> {
        (0..count).map(|i| search_entry(&video_id(i))).collect()
    }

    pub fn candidate(id: &str, rank: usize) -> Candidate {
        Candidate::from_entry(search_entry(id), rank)
    }

    /// `count` ranked candidates, `vid00`, `vid01`, ...
    pub fn candidates(count: usize) -> Vec<Candidate> {
        (0..count).map(|i| candidate(&video_id(i), i)).collect()
    }

    /// Writes `<dir>/<id>.mp3` for each id and returns them as fetched files.
    pub fn fetched_files(dir: &Path, ids: &[&str]) -> std::io::Result<Vec<FetchedFile>> {
        ids.iter()
            .map(|id| {
                let path = dir.join(format!("{}.mp3", id));
                let contents = format!("audio:{}", id);
                std::fs::write(&path, &contents)?;
                Ok(FetchedFile {
                    source_id: id.to_string(),
                    local_path: path,
                    size_bytes: contents.len() as u64,
                })
            })
            .collect()
    }

    /// Writes `<dir>/<id>_trimmed.mp3` containing `[<id>]` for each id.
    pub fn trimmed_clips(dir: &Path, ids: &[&str]) -> std::io::Result<Vec<TrimmedClip>> {
        ids.iter()
            .map(|id| {
                let path = dir.join(format!("{}_trimmed.mp3", id));
                std::fs::write(&path, format!("[{}]", id))?;
                Ok(TrimmedClip {
                    source_id: id.to_string(),
                    local_path: path,
                    duration_seconds: 25,
                })
            })
            .collect()
    }

    /// Default config with sleep-free polling.
    pub fn fast_config() -> Config {
        let mut config = Config::default();
        config.stability = PollConfig {
            max_attempts: 3,
            delay_ms: 0,
        };
        config.lock_wait = PollConfig {
            max_attempts: 3,
            delay_ms: 0,
        };
        config.pipeline.settle_delay_ms = 0;
        config
    }
}
