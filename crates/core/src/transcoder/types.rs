//! Job descriptions for the transcoder.

use std::path::PathBuf;

/// Cut the leading window of a file and re-encode its audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Start offset in seconds.
    pub start_secs: u32,
    /// Length of the clip in seconds.
    pub duration_secs: u32,
    /// FFmpeg audio encoder name.
    pub codec: String,
    pub bitrate_kbps: u32,
}

/// Join the files listed in a concat manifest without re-encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatJob {
    pub manifest_path: PathBuf,
    pub output_path: PathBuf,
}
