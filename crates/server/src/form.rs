//! Web form parsing and validation.

use regex_lite::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use mashup_core::coerce_positive_int;
use mashup_core::request::{MIN_CLIP_SECONDS, MIN_VIDEO_COUNT};

/// Loose shape check: something, `@`, something, `.`, something.
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Default number of videos shown in the form.
pub const DEFAULT_VIDEO_COUNT: u32 = 12;

/// Default clip duration shown in the form.
pub const DEFAULT_CLIP_DURATION: u32 = 25;

/// Raw form submission. Missing fields arrive as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MashupForm {
    #[serde(default)]
    pub singer: String,
    #[serde(default)]
    pub video_count: String,
    #[serde(default)]
    pub clip_duration: String,
    #[serde(default)]
    pub email: String,
}

/// A submission that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub singer: String,
    pub video_count: u32,
    pub clip_seconds: u32,
    pub email: String,
}

impl MashupForm {
    /// Checks every field, collecting all problems instead of stopping at
    /// the first one.
    pub fn validate(&self) -> Result<ValidSubmission, Vec<String>> {
        let mut errors = Vec::new();

        let singer = self.singer.trim();
        if singer.is_empty() {
            errors.push("Singer name is required.".to_string());
        }

        let video_count = match coerce_positive_int(&self.video_count, "Number of videos") {
            Ok(n) if n > MIN_VIDEO_COUNT => Some(n),
            Ok(_) => {
                errors.push(format!(
                    "Number of videos must be greater than {}.",
                    MIN_VIDEO_COUNT
                ));
                None
            }
            Err(e) => {
                errors.push(e.to_string());
                None
            }
        };

        let clip_seconds = match coerce_positive_int(&self.clip_duration, "Duration") {
            Ok(n) if n > MIN_CLIP_SECONDS => Some(n),
            Ok(_) => {
                errors.push(format!(
                    "Duration must be greater than {} seconds.",
                    MIN_CLIP_SECONDS
                ));
                None
            }
            Err(e) => {
                errors.push(e.to_string());
                None
            }
        };

        let email = self.email.trim();
        if !is_valid_email(email) {
            errors.push("Please provide a valid email address.".to_string());
        }

        match (video_count, clip_seconds) {
            (Some(video_count), Some(clip_seconds)) if errors.is_empty() => Ok(ValidSubmission {
                singer: singer.to_string(),
                video_count,
                clip_seconds,
                email: email.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}
