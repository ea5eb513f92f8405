//! Mock mashup runner for front-end tests.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::MashupError;
use crate::orchestrator::MashupRunner;
use crate::request::MashupRequest;

/// Mock implementation of the MashupRunner trait.
///
/// On success writes the configured bytes to the request's output path, so
/// callers can read the "mashup" back.
#[derive(Debug)]
pub struct MockRunner {
    /// Recorded requests.
    requests: Arc<RwLock<Vec<MashupRequest>>>,
    /// Bytes written as the mashup.
    output: Arc<RwLock<Vec<u8>>>,
    /// If set, the next run will fail with this error.
    next_error: Arc<RwLock<Option<MashupError>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            output: Arc::new(RwLock::new(b"mock mashup".to_vec())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the bytes written for subsequent runs.
    pub async fn set_output(&self, bytes: &[u8]) {
        *self.output.write().await = bytes.to_vec();
    }

    /// Configure the next run to fail with the given error.
    pub async fn set_next_error(&self, error: MashupError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get recorded requests.
    pub async fn recorded_requests(&self) -> Vec<MashupRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl MashupRunner for MockRunner {
    async fn run(&self, request: &MashupRequest) -> Result<PathBuf, MashupError> {
        self.requests.write().await.push(request.clone());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let output = request.output_path().to_path_buf();
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = self.output.read().await.clone();
        tokio::fs::write(&output, bytes).await?;
        Ok(output)
    }
}
