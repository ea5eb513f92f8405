//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running ffmpeg.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// FFmpeg ran but did not succeed.
    #[error("Transcoding failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// FFmpeg did not finish in time.
    #[error("Transcoding timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error while spawning or waiting.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// Creates a failure carrying captured stderr.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Captured stderr, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}
