//! Transcoder module for trimming and joining audio.
//!
//! This module provides the `Transcoder` trait and an FFmpeg implementation
//! with the two operations the pipeline needs:
//!
//! - Trim: keep the leading window of a file, re-encoded to a fixed codec
//!   and bitrate, video discarded
//! - Concat: join clips listed in a manifest with stream copy (no re-encode)
//!
//! # Example
//!
//! ```ignore
//! use mashup_core::transcoder::{FfmpegTranscoder, Transcoder, TrimJob};
//!
//! let transcoder = FfmpegTranscoder::with_defaults();
//! let backend = locator.locate().await?;
//!
//! transcoder.trim(&backend, &TrimJob {
//!     input_path: PathBuf::from("/work/downloads/abc.mp3"),
//!     output_path: PathBuf::from("/work/trimmed/abc_trimmed.mp3"),
//!     start_secs: 0,
//!     duration_secs: 25,
//!     codec: "libmp3lame".to_string(),
//!     bitrate_kbps: 192,
//! }).await?;
//! ```

mod error;
mod ffmpeg;
mod traits;
mod types;

pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::Transcoder;
pub use types::{ConcatJob, TrimJob};
