//! Mock backend locator for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::{Backend, BackendLocator, LocatorError};

/// Mock implementation of the BackendLocator trait.
///
/// Returns a fixed [`Backend`] without touching the filesystem, or fails
/// with [`LocatorError::DownloadFailed`] once made unavailable.
#[derive(Debug)]
pub struct MockLocator {
    backend: Backend,
    unavailable: Arc<RwLock<Option<String>>>,
    calls: AtomicUsize,
}

impl Default for MockLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLocator {
    pub fn new() -> Self {
        Self::with_backend(super::fixtures::backend())
    }

    pub fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            unavailable: Arc::new(RwLock::new(None)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent `locate` fail with `reason`.
    pub async fn set_unavailable(&self, reason: &str) {
        *self.unavailable.write().await = Some(reason.to_string());
    }

    /// Number of `locate` calls so far.
    pub fn locate_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendLocator for MockLocator {
    async fn locate(&self) -> Result<Backend, LocatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.unavailable.read().await.clone() {
            return Err(LocatorError::DownloadFailed(reason));
        }
        Ok(self.backend.clone())
    }
}
