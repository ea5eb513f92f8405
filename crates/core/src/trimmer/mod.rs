//! Clip trimming.
//!
//! Cuts the leading window of every fetched file into `<stem>_trimmed.mp3`,
//! waiting out transient file locks first. Files that stay locked, cannot
//! be opened, or fail to transcode are skipped.

use async_trait::async_trait;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::config::TranscoderConfig;
use crate::error::MashupError;
use crate::fetcher::FetchedFile;
use crate::request::OUTPUT_EXTENSION;
use crate::retry::RetryPolicy;
use crate::transcoder::{TranscodeError, Transcoder, TrimJob};

/// A fixed-length clip cut from a fetched file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrimmedClip {
    pub source_id: String,
    pub local_path: PathBuf,
    pub duration_seconds: u32,
}

/// Why a fetched file produced no [`TrimmedClip`].
#[derive(Debug, Error)]
pub enum TrimSkip {
    #[error("file remains locked after retries: {path}")]
    Locked { path: PathBuf },

    #[error("cannot open {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    TranscodeFailed(#[from] TranscodeError),
}

/// Checks whether a file can be opened for reading.
///
/// The lock-wait retries while this reports [`ErrorKind::PermissionDenied`].
#[async_trait]
pub trait ReadCheck: Send + Sync {
    async fn open_for_read(&self, path: &Path) -> std::io::Result<()>;
}

/// Opens the file on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReadCheck;

#[async_trait]
impl ReadCheck for FsReadCheck {
    async fn open_for_read(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::File::open(path).await.map(|_| ())
    }
}

/// Trims fetched files through a [`Transcoder`].
pub struct ClipTrimmer {
    transcoder: Arc<dyn Transcoder>,
    read_check: Arc<dyn ReadCheck>,
    lock_wait: RetryPolicy,
    codec: String,
    bitrate_kbps: u32,
}

impl ClipTrimmer {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        lock_wait: RetryPolicy,
        config: &TranscoderConfig,
    ) -> Self {
        Self {
            transcoder,
            read_check: Arc::new(FsReadCheck),
            lock_wait,
            codec: config.clip_codec.clone(),
            bitrate_kbps: config.clip_bitrate_kbps,
        }
    }

    /// Replaces how files are checked for readability before trimming.
    pub fn with_read_check(mut self, read_check: Arc<dyn ReadCheck>) -> Self {
        self.read_check = read_check;
        self
    }

    /// Trims `files` in order into `trimmed_dir`.
    ///
    /// Output order follows input order. An empty result is
    /// [`MashupError::NoClipsProduced`].
    pub async fn trim(
        &self,
        backend: &Backend,
        files: &[FetchedFile],
        clip_seconds: u32,
        trimmed_dir: &Path,
    ) -> Result<Vec<TrimmedClip>, MashupError> {
        tokio::fs::create_dir_all(trimmed_dir).await?;

        let mut clips = Vec::with_capacity(files.len());
        for file in files {
            match self.trim_one(backend, file, clip_seconds, trimmed_dir).await {
                Ok(clip) => {
                    debug!(source_id = %clip.source_id, "Trimmed {:?}", clip.local_path);
                    clips.push(clip);
                }
                Err(skip) => {
                    warn!(source_id = %file.source_id, "Skipping file: {}", skip);
                }
            }
        }

        info!(
            clips = clips.len(),
            files = files.len(),
            clip_seconds,
            "Trim stage finished"
        );

        if clips.is_empty() {
            return Err(MashupError::NoClipsProduced);
        }
        Ok(clips)
    }

    /// Trims a single file.
    pub async fn trim_one(
        &self,
        backend: &Backend,
        file: &FetchedFile,
        clip_seconds: u32,
        trimmed_dir: &Path,
    ) -> Result<TrimmedClip, TrimSkip> {
        self.wait_for_unlock(&file.local_path).await?;

        let output_path = trimmed_dir.join(trimmed_file_name(&file.local_path));
        let job = TrimJob {
            input_path: file.local_path.clone(),
            output_path: output_path.clone(),
            start_secs: 0,
            duration_secs: clip_seconds,
            codec: self.codec.clone(),
            bitrate_kbps: self.bitrate_kbps,
        };
        self.transcoder.trim(backend, &job).await?;

        Ok(TrimmedClip {
            source_id: file.source_id.clone(),
            local_path: output_path,
            duration_seconds: clip_seconds,
        })
    }

    /// Retries opening `path` for reading while it reports permission
    /// denied. Any other open error skips the file at once.
    async fn wait_for_unlock(&self, path: &Path) -> Result<(), TrimSkip> {
        let read_check = self.read_check.as_ref();
        let opened = self
            .lock_wait
            .poll(move || async move {
                match read_check.open_for_read(path).await {
                    Ok(()) => Ok(Some(())),
                    Err(e) if e.kind() == ErrorKind::PermissionDenied => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(|source| TrimSkip::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;

        opened.ok_or_else(|| TrimSkip::Locked {
            path: path.to_path_buf(),
        })
    }
}

/// `<stem>_trimmed.mp3` for a source file.
pub fn trimmed_file_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "clip".to_string());
    format!("{}_trimmed.{}", stem, OUTPUT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockTranscoder};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    /// Reports permission denied for the first `locked_for` checks.
    struct LockedFor {
        locked_for: u32,
        checks: AtomicU32,
    }

    impl LockedFor {
        fn new(locked_for: u32) -> Arc<Self> {
            Arc::new(Self {
                locked_for,
                checks: AtomicU32::new(0),
            })
        }

        fn checks(&self) -> u32 {
            self.checks.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReadCheck for LockedFor {
        async fn open_for_read(&self, _path: &Path) -> std::io::Result<()> {
            let seen = self.checks.fetch_add(1, Ordering::SeqCst);
            if seen < self.locked_for {
                Err(std::io::Error::from(ErrorKind::PermissionDenied))
            } else {
                Ok(())
            }
        }
    }

    fn trimmer(transcoder: &Arc<MockTranscoder>) -> ClipTrimmer {
        ClipTrimmer::new(
            transcoder.clone(),
            RetryPolicy::immediate(3),
            &TranscoderConfig::default(),
        )
    }

    #[test]
    fn test_trimmed_file_name() {
        assert_eq!(trimmed_file_name(Path::new("/d/abc.mp3")), "abc_trimmed.mp3");
        assert_eq!(trimmed_file_name(Path::new("/d/abc.m4a")), "abc_trimmed.mp3");
        assert_eq!(trimmed_file_name(Path::new("/d/a.b.webm")), "a.b_trimmed.mp3");
    }

    #[tokio::test]
    async fn test_failed_clip_is_skipped_in_order() {
        let temp = TempDir::new().unwrap();
        let files = fixtures::fetched_files(temp.path(), &["A", "B", "C"]).unwrap();
        let transcoder = Arc::new(MockTranscoder::new());
        transcoder.fail_trim_for("B").await;

        let clips = trimmer(&transcoder)
            .trim(&fixtures::backend(), &files, 25, &temp.path().join("trimmed"))
            .await
            .unwrap();

        let ids: Vec<_> = clips.iter().map(|c| c.source_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(
            clips[0].local_path,
            temp.path().join("trimmed").join("A_trimmed.mp3")
        );
        assert!(clips.iter().all(|c| c.duration_seconds == 25));
        assert!(clips.iter().all(|c| c.local_path.exists()));

        let jobs = transcoder.recorded_trims().await;
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].duration_secs, 25);
        assert_eq!(jobs[0].start_secs, 0);
        assert_eq!(jobs[0].codec, "libmp3lame");
        assert_eq!(jobs[0].bitrate_kbps, 192);
    }

    #[tokio::test]
    async fn test_missing_file_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let transcoder = Arc::new(MockTranscoder::new());
        let file = FetchedFile {
            source_id: "gone".into(),
            local_path: temp.path().join("gone.mp3"),
            size_bytes: 10,
        };

        let skip = trimmer(&transcoder)
            .trim_one(&fixtures::backend(), &file, 25, temp.path())
            .await
            .unwrap_err();

        assert!(matches!(skip, TrimSkip::Unreadable { .. }));
        // Never reached the transcoder
        assert!(transcoder.recorded_trims().await.is_empty());
    }

    #[tokio::test]
    async fn test_all_failing_is_no_clips() {
        let temp = TempDir::new().unwrap();
        let files = fixtures::fetched_files(temp.path(), &["A", "B"]).unwrap();
        let transcoder = Arc::new(MockTranscoder::new());
        transcoder.fail_trim_for("A").await;
        transcoder.fail_trim_for("B").await;

        let err = trimmer(&transcoder)
            .trim(&fixtures::backend(), &files, 25, &temp.path().join("trimmed"))
            .await
            .unwrap_err();
        assert!(matches!(err, MashupError::NoClipsProduced));
    }

    #[tokio::test]
    async fn test_lock_released_before_attempts_run_out() {
        let temp = TempDir::new().unwrap();
        let files = fixtures::fetched_files(temp.path(), &["A"]).unwrap();
        let transcoder = Arc::new(MockTranscoder::new());
        let check = LockedFor::new(2);

        let clip = trimmer(&transcoder)
            .with_read_check(check.clone())
            .trim_one(&fixtures::backend(), &files[0], 25, temp.path())
            .await
            .unwrap();

        assert_eq!(clip.source_id, "A");
        assert!(clip.local_path.exists());
        assert_eq!(check.checks(), 3);
        assert_eq!(transcoder.recorded_trims().await.len(), 1);
    }

    #[tokio::test]
    async fn test_locked_throughout_is_skipped() {
        let temp = TempDir::new().unwrap();
        let files = fixtures::fetched_files(temp.path(), &["A"]).unwrap();
        let transcoder = Arc::new(MockTranscoder::new());
        let check = LockedFor::new(u32::MAX);

        let skip = trimmer(&transcoder)
            .with_read_check(check.clone())
            .trim_one(&fixtures::backend(), &files[0], 25, temp.path())
            .await
            .unwrap_err();

        assert!(matches!(skip, TrimSkip::Locked { .. }));
        assert_eq!(check.checks(), 3);
        assert!(transcoder.recorded_trims().await.is_empty());
    }

    #[tokio::test]
    async fn test_locked_file_is_dropped_from_stage() {
        let temp = TempDir::new().unwrap();
        let files = fixtures::fetched_files(temp.path(), &["A", "B"]).unwrap();
        let transcoder = Arc::new(MockTranscoder::new());

        // A exhausts its three checks; B opens on the fourth.
        let clips = trimmer(&transcoder)
            .with_read_check(LockedFor::new(3))
            .trim(&fixtures::backend(), &files, 25, &temp.path().join("trimmed"))
            .await
            .unwrap();

        let ids: Vec<_> = clips.iter().map(|c| c.source_id.as_str()).collect();
        assert_eq!(ids, vec!["B"]);
    }
}
