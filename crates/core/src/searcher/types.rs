//! Types for candidate discovery.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// One entry of a search result, as reported by the search backend.
///
/// Either field may be missing; such entries are filtered or skipped later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SearchEntry {
    /// True when the entry carries neither a URL nor an ID.
    pub fn is_blank(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        blank(&self.id) && blank(&self.url)
    }
}

/// A discovered item, ready to be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub source_url: Option<String>,
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Zero-based position in discovery order.
    pub rank: usize,
}

impl Candidate {
    pub fn from_entry(entry: SearchEntry, rank: usize) -> Self {
        Self {
            source_url: entry.url,
            source_id: entry.id,
            title: entry.title,
            rank,
        }
    }
}

/// Errors from the search backend.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search tool not found at {path}")]
    ToolNotFound { path: PathBuf },

    #[error("search timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("search failed: {reason}")]
    Failed { reason: String },

    #[error("invalid search response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can run a video search.
#[async_trait]
pub trait VideoSearcher: Send + Sync {
    /// Returns the name of this searcher implementation.
    fn name(&self) -> &str;

    /// Runs `query`, asking for at most `limit` results, in backend rank order.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchEntry>, SearchError>;
}
