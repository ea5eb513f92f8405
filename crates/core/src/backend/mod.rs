//! Transcoder backend resolution.
//!
//! The [`BackendLocator`] finds a working ffmpeg executable, preferring a
//! configured or system-wide install and falling back to a cached or freshly
//! downloaded platform build. The result is a [`Backend`] value that stages
//! pass to every child process they spawn.

mod locator;
mod types;

pub use locator::{
    install_executable, verify_checksum, BackendLocator, BinaryFetcher, FfmpegLocator,
    HttpBinaryFetcher,
};
pub use types::{Backend, LocatorError, Platform};
