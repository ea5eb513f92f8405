//! Request validation.
//!
//! A [`MashupRequest`] can only be built through its validating
//! constructors, so holding one means the thresholds were checked.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::MashupError;

/// Extension every mashup output carries.
pub const OUTPUT_EXTENSION: &str = "mp3";

/// Smallest accepted video count is `MIN_VIDEO_COUNT + 1`.
pub const MIN_VIDEO_COUNT: u32 = 10;

/// Smallest accepted clip length is `MIN_CLIP_SECONDS + 1`.
pub const MIN_CLIP_SECONDS: u32 = 20;

/// A validated mashup request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MashupRequest {
    singer: String,
    video_count: u32,
    clip_seconds: u32,
    output_path: PathBuf,
}

impl MashupRequest {
    /// Validates already-numeric parameters.
    pub fn new(
        singer: impl Into<String>,
        video_count: u32,
        clip_seconds: u32,
        output_path: impl AsRef<Path>,
    ) -> Result<Self, MashupError> {
        let singer = singer.into();
        validate(&singer, video_count, clip_seconds)?;

        Ok(Self {
            singer: singer.trim().to_string(),
            video_count,
            clip_seconds,
            output_path: normalize_output_path(output_path.as_ref()),
        })
    }

    /// Coerces raw (string) numeric input, then validates.
    pub fn parse(
        singer: impl Into<String>,
        video_count: &str,
        clip_seconds: &str,
        output_path: impl AsRef<Path>,
    ) -> Result<Self, MashupError> {
        let video_count = coerce_positive_int(video_count, "Number of videos")?;
        let clip_seconds = coerce_positive_int(clip_seconds, "Audio duration")?;
        Self::new(singer, video_count, clip_seconds, output_path)
    }

    pub fn singer(&self) -> &str {
        &self.singer
    }

    pub fn video_count(&self) -> u32 {
        self.video_count
    }

    pub fn clip_seconds(&self) -> u32 {
        self.clip_seconds
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

/// Checks the policy thresholds. No side effects.
pub fn validate(singer: &str, video_count: u32, clip_seconds: u32) -> Result<(), MashupError> {
    if singer.trim().is_empty() {
        return Err(MashupError::invalid("Singer name cannot be empty."));
    }
    if video_count <= MIN_VIDEO_COUNT {
        return Err(MashupError::invalid(format!(
            "Number of videos must be greater than {MIN_VIDEO_COUNT}."
        )));
    }
    if clip_seconds <= MIN_CLIP_SECONDS {
        return Err(MashupError::invalid(format!(
            "Audio duration must be greater than {MIN_CLIP_SECONDS} seconds."
        )));
    }
    Ok(())
}

/// Parses a raw value into a positive integer.
pub fn coerce_positive_int(raw: &str, name: &str) -> Result<u32, MashupError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| MashupError::invalid(format!("{name} must be an integer.")))?;
    if value <= 0 {
        return Err(MashupError::invalid(format!(
            "{name} must be greater than 0."
        )));
    }
    u32::try_from(value).map_err(|_| MashupError::invalid(format!("{name} is too large.")))
}

/// Forces the output extension to `.mp3`, keeping an existing one in any case.
pub fn normalize_output_path(path: &Path) -> PathBuf {
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(OUTPUT_EXTENSION));
    if has_extension {
        path.to_path_buf()
    } else {
        path.with_extension(OUTPUT_EXTENSION)
    }
}
