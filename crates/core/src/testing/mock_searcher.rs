//! Mock searcher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::searcher::{SearchEntry, SearchError, VideoSearcher};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    /// The query that was searched.
    pub query: String,
    /// The requested result limit.
    pub limit: u32,
}

/// Mock implementation of the VideoSearcher trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable search results (truncated to the requested limit)
/// - Track search queries for assertions
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// use mashup_core::testing::{MockSearcher, fixtures};
///
/// let searcher = MockSearcher::with_results(fixtures::search_entries(30));
/// let entries = searcher.search("Test Singer songs", 24).await?;
/// assert_eq!(entries.len(), 24);
///
/// let searches = searcher.recorded_searches().await;
/// assert_eq!(searches[0].limit, 24);
/// ```
#[derive(Debug)]
pub struct MockSearcher {
    /// Configured results to return.
    results: Arc<RwLock<Vec<SearchEntry>>>,
    /// Recorded search queries.
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearcher {
    /// Create a new mock searcher with empty results.
    pub fn new() -> Self {
        Self::with_results(Vec::new())
    }

    /// Create a mock searcher with predefined results.
    pub fn with_results(results: Vec<SearchEntry>) -> Self {
        Self {
            results: Arc::new(RwLock::new(results)),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the results to return for subsequent searches.
    pub async fn set_results(&self, results: Vec<SearchEntry>) {
        *self.results.write().await = results;
    }

    /// Get recorded search queries.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Get the number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl VideoSearcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchEntry>, SearchError> {
        self.searches.write().await.push(RecordedSearch {
            query: query.to_string(),
            limit,
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let results = self.results.read().await;
        Ok(results.iter().take(limit as usize).cloned().collect())
    }
}
