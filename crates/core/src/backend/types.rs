//! Types for the transcoder backend.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

/// A resolved ffmpeg installation.
///
/// Handed explicitly to every subprocess invocation instead of mutating the
/// process environment, so concurrent runs cannot interfere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    ffmpeg_path: PathBuf,
    search_path: OsString,
}

impl Backend {
    /// Builds a backend whose search path is `base_search_path` with the
    /// ffmpeg directory in front.
    pub fn new(ffmpeg_path: impl Into<PathBuf>, base_search_path: Option<&OsStr>) -> Self {
        let ffmpeg_path = ffmpeg_path.into();
        let base = base_search_path.map(OsStr::to_os_string).unwrap_or_default();

        let search_path = match ffmpeg_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => {
                let dirs = std::iter::once(dir.to_path_buf()).chain(std::env::split_paths(&base));
                std::env::join_paths(dirs).unwrap_or(base)
            }
            None => base,
        };

        Self {
            ffmpeg_path,
            search_path,
        }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    /// `PATH` value given to child processes.
    pub fn search_path(&self) -> &OsStr {
        &self.search_path
    }

    /// A command for `program` with this backend's search path.
    pub fn command(&self, program: impl AsRef<OsStr>) -> Command {
        let mut command = Command::new(program);
        command.env("PATH", &self.search_path);
        command
    }
}

/// Platform key of a downloadable ffmpeg build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Platform {
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }

    /// Name of the published build for this platform, if one exists.
    pub fn asset_name(&self) -> Option<&'static str> {
        match (self.os, self.arch) {
            ("linux", "x86_64") => Some("ffmpeg-linux64-v4.2.2"),
            ("linux", "x86") => Some("ffmpeg-linux32-v4.2.2"),
            ("linux", "aarch64") => Some("ffmpeg-linux-aarch64-v4.2.2"),
            ("windows", "x86_64") => Some("ffmpeg-win64-v4.2.2.exe"),
            ("windows", "x86") => Some("ffmpeg-win32-v4.2.2.exe"),
            ("macos", "x86_64") | ("macos", "aarch64") => Some("ffmpeg-osx64-v4.2.2"),
            _ => None,
        }
    }

    /// File name of the ffmpeg executable on this platform.
    pub fn executable_name(&self) -> &'static str {
        if self.os == "windows" {
            "ffmpeg.exe"
        } else {
            "ffmpeg"
        }
    }
}

/// Errors that can occur while locating the transcoder.
#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("ffmpeg not found at configured path: {path}")]
    NotFound { path: PathBuf },

    #[error("no ffmpeg build is published for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("ffmpeg download failed: {0}")]
    DownloadFailed(String),

    #[error("checksum mismatch for downloaded ffmpeg: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("ffmpeg at {path} is not usable: {reason}")]
    Unusable { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
