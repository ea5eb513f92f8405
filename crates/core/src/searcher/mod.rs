//! Candidate discovery.
//!
//! This module provides a `VideoSearcher` trait for querying a search
//! backend, a yt-dlp implementation, and [`discover`], which turns a singer
//! name into a ranked, oversampled list of [`Candidate`]s.

mod types;
mod ytdlp;

pub use types::*;
pub use ytdlp::{parse_search_output, YtDlpSearcher};

use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::error::MashupError;

/// Query sent to the search backend for `singer`.
pub fn search_query(singer: &str, config: &SearchConfig) -> String {
    let singer = singer.trim();
    if config.query_suffix.is_empty() {
        singer.to_string()
    } else {
        format!("{} {}", singer, config.query_suffix)
    }
}

/// Number of results requested for `video_count` wanted videos.
///
/// Oversampled to absorb per-item download failures.
pub fn result_limit(video_count: u32, config: &SearchConfig) -> u32 {
    video_count
        .saturating_mul(config.oversample_factor)
        .max(config.min_results)
}

/// Searches for `singer` and returns candidates in rank order.
///
/// Entries with neither URL nor ID are dropped. An empty result is
/// [`MashupError::NoCandidatesFound`]; a short but non-empty one is not an
/// error here.
pub async fn discover(
    searcher: &dyn VideoSearcher,
    config: &SearchConfig,
    singer: &str,
    video_count: u32,
) -> Result<Vec<Candidate>, MashupError> {
    let query = search_query(singer, config);
    let limit = result_limit(video_count, config);

    info!(searcher = searcher.name(), query = %query, limit, "Searching for candidates");
    let entries = searcher.search(&query, limit).await?;
    let total = entries.len();

    let candidates: Vec<Candidate> = entries
        .into_iter()
        .filter(|entry| !entry.is_blank())
        .enumerate()
        .map(|(rank, entry)| Candidate::from_entry(entry, rank))
        .collect();

    if candidates.is_empty() {
        return Err(MashupError::NoCandidatesFound);
    }
    if candidates.len() < total {
        warn!(
            dropped = total - candidates.len(),
            "Dropped search entries without URL or ID"
        );
    }

    info!(count = candidates.len(), "Discovered candidates");
    Ok(candidates)
}
