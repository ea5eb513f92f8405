//! Fatal, run-level errors of the mashup pipeline.

use thiserror::Error;

use crate::backend::LocatorError;
use crate::searcher::SearchError;
use crate::transcoder::TranscodeError;

/// Errors that abort a mashup run.
///
/// Per-item failures never surface here; they are reported as
/// [`FetchSkip`](crate::fetcher::FetchSkip) or
/// [`TrimSkip`](crate::trimmer::TrimSkip) and only drive one of the
/// aggregate conditions below.
#[derive(Debug, Error)]
pub enum MashupError {
    /// Bad input; no I/O was attempted.
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Unable to locate or download ffmpeg: {0}")]
    BackendUnavailable(#[from] LocatorError),

    #[error("Search failed: {0}")]
    SearchFailed(#[from] SearchError),

    #[error("No videos found for the provided singer name.")]
    NoCandidatesFound,

    #[error(
        "Downloaded only {obtained} of {requested} requested videos. \
         Try again with a smaller number or a different singer."
    )]
    InsufficientDownloads { obtained: usize, requested: usize },

    #[error("No audio files were trimmed.")]
    NoClipsProduced,

    #[error("No trimmed audio files to merge.")]
    NoClipsToMerge,

    #[error("Failed to merge clips: {0}")]
    MergeFailed(#[source] TranscodeError),

    #[error("Failed to prepare workspace: {0}")]
    Workspace(#[from] std::io::Error),
}

impl MashupError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    /// Stable short name, used in logs and front-end responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::BackendUnavailable(_) => "backend_unavailable",
            Self::SearchFailed(_) => "search_failed",
            Self::NoCandidatesFound => "no_candidates_found",
            Self::InsufficientDownloads { .. } => "insufficient_downloads",
            Self::NoClipsProduced => "no_clips_produced",
            Self::NoClipsToMerge => "no_clips_to_merge",
            Self::MergeFailed(_) => "merge_failed",
            Self::Workspace(_) => "workspace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_downloads_message() {
        let err = MashupError::InsufficientDownloads {
            obtained: 7,
            requested: 12,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Downloaded only 7 of 12 requested videos."));
        assert_eq!(err.kind(), "insufficient_downloads");
    }

    #[test]
    fn test_invalid_request_message_is_verbatim() {
        let err = MashupError::invalid("Singer name cannot be empty.");
        assert_eq!(err.to_string(), "Singer name cannot be empty.");
    }
}
