//! Mock transcoder for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::Backend;
use crate::transcoder::{ConcatJob, TranscodeError, Transcoder, TrimJob};

/// Mock implementation of the Transcoder trait.
///
/// - `trim` writes `[<stem>:<duration>s]` to the output, so merged files
///   show which clips went in and in what order
/// - `concat` reads the manifest and joins the listed files byte for byte,
///   like a stream copy would
///
/// # Example
///
/// ```rust,ignore
/// use mashup_core::testing::MockTranscoder;
///
/// let transcoder = MockTranscoder::new();
/// transcoder.fail_trim_for("B").await;
///
/// let trims = transcoder.recorded_trims().await;
/// ```
#[derive(Debug)]
pub struct MockTranscoder {
    /// Recorded trim jobs.
    trims: Arc<RwLock<Vec<TrimJob>>>,
    /// Recorded concat jobs with the manifest text seen at call time.
    concats: Arc<RwLock<Vec<(ConcatJob, String)>>>,
    /// Input file stems whose trim fails.
    failing_trims: Arc<RwLock<HashSet<String>>>,
    /// If set, the next concat will fail with this error.
    next_concat_error: Arc<RwLock<Option<TranscodeError>>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a new mock transcoder where everything succeeds.
    pub fn new() -> Self {
        Self {
            trims: Arc::new(RwLock::new(Vec::new())),
            concats: Arc::new(RwLock::new(Vec::new())),
            failing_trims: Arc::new(RwLock::new(HashSet::new())),
            next_concat_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Make trims of inputs with file stem `stem` fail.
    pub async fn fail_trim_for(&self, stem: &str) {
        self.failing_trims.write().await.insert(stem.to_string());
    }

    /// Configure the next concat to fail with the given error.
    pub async fn set_next_concat_error(&self, error: TranscodeError) {
        *self.next_concat_error.write().await = Some(error);
    }

    /// Get recorded trim jobs.
    pub async fn recorded_trims(&self) -> Vec<TrimJob> {
        self.trims.read().await.clone()
    }

    /// Get recorded concat jobs.
    pub async fn recorded_concats(&self) -> Vec<ConcatJob> {
        self.concats
            .read()
            .await
            .iter()
            .map(|(job, _)| job.clone())
            .collect()
    }

    /// Get the manifests handed to concat, in call order.
    pub async fn recorded_manifests(&self) -> Vec<String> {
        self.concats
            .read()
            .await
            .iter()
            .map(|(_, manifest)| manifest.clone())
            .collect()
    }
}

/// Reads the paths back out of a concat manifest.
pub fn parse_manifest(manifest: &str) -> Vec<PathBuf> {
    manifest
        .lines()
        .filter_map(|line| line.strip_prefix("file '")?.strip_suffix('\''))
        .map(|quoted| PathBuf::from(quoted.replace(r"'\''", "'")))
        .collect()
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn trim(&self, _backend: &Backend, job: &TrimJob) -> Result<(), TranscodeError> {
        self.trims.write().await.push(job.clone());

        let stem = stem(&job.input_path);
        if self.failing_trims.read().await.contains(&stem) {
            return Err(TranscodeError::failed(
                "FFmpeg exited with code: Some(1)",
                Some(format!("{}: Invalid data found when processing input", stem)),
            ));
        }
        if !job.input_path.exists() {
            return Err(TranscodeError::InputNotFound {
                path: job.input_path.clone(),
            });
        }

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(
            &job.output_path,
            format!("[{}:{}s]", stem, job.duration_secs),
        )
        .await?;
        Ok(())
    }

    async fn concat(&self, _backend: &Backend, job: &ConcatJob) -> Result<(), TranscodeError> {
        let manifest = tokio::fs::read_to_string(&job.manifest_path).await?;
        self.concats
            .write()
            .await
            .push((job.clone(), manifest.clone()));

        if let Some(error) = self.next_concat_error.write().await.take() {
            return Err(error);
        }

        let mut merged = Vec::new();
        for path in parse_manifest(&manifest) {
            merged.extend(tokio::fs::read(&path).await?);
        }
        tokio::fs::write(&job.output_path, merged).await?;
        Ok(())
    }
}
