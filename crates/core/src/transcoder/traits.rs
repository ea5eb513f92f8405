//! Trait definitions for the transcoder module.

use async_trait::async_trait;

use super::error::TranscodeError;
use super::types::{ConcatJob, TrimJob};
use crate::backend::Backend;

/// Something that can trim and concatenate audio files.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Writes `job.output_path` containing the requested window of the input.
    async fn trim(&self, backend: &Backend, job: &TrimJob) -> Result<(), TranscodeError>;

    /// Writes `job.output_path` as the stream-copy concatenation of the
    /// manifest entries, in manifest order.
    async fn concat(&self, backend: &Backend, job: &ConcatJob) -> Result<(), TranscodeError>;
}
