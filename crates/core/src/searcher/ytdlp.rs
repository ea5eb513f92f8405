//! yt-dlp search backend.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::types::{SearchEntry, SearchError, VideoSearcher};
use crate::config::SearchConfig;

/// Searches YouTube through `yt-dlp --flat-playlist`.
pub struct YtDlpSearcher {
    ytdlp_path: PathBuf,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct Playlist {
    #[serde(default)]
    entries: Vec<Option<RawEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: Option<String>,
    webpage_url: Option<String>,
    url: Option<String>,
    title: Option<String>,
}

impl YtDlpSearcher {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            ytdlp_path: config.ytdlp_path.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    fn build_args(query: &str, limit: u32) -> Vec<String> {
        vec![
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            format!("ytsearch{}:{}", limit, query),
        ]
    }
}

/// Parses the single-JSON dump of a search playlist. Null entries are dropped.
pub fn parse_search_output(stdout: &[u8]) -> Result<Vec<SearchEntry>, SearchError> {
    let playlist: Playlist = serde_json::from_slice(stdout)
        .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

    Ok(playlist
        .entries
        .into_iter()
        .flatten()
        .map(|raw| SearchEntry {
            id: raw.id,
            url: raw.webpage_url.or(raw.url),
            title: raw.title,
        })
        .collect())
}

#[async_trait]
impl VideoSearcher for YtDlpSearcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchEntry>, SearchError> {
        let args = Self::build_args(query, limit);
        debug!("Running {:?} {:?}", self.ytdlp_path, args);

        let child = Command::new(&self.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SearchError::ToolNotFound {
                        path: self.ytdlp_path.clone(),
                    }
                } else {
                    SearchError::Io(e)
                }
            })?;

        let output = timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| SearchError::Timeout {
            timeout_secs: self.timeout_secs,
        })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SearchError::Failed {
                reason: stderr
                    .lines()
                    .rev()
                    .find(|l| !l.trim().is_empty())
                    .unwrap_or("yt-dlp exited with an error")
                    .to_string(),
            });
        }

        parse_search_output(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let args = YtDlpSearcher::build_args("Test Singer songs", 24);
        assert!(args.contains(&"--flat-playlist".to_string()));
        assert!(args.contains(&"--dump-single-json".to_string()));
        assert_eq!(args.last().unwrap(), "ytsearch24:Test Singer songs");
    }

    #[test]
    fn test_parse_search_output() {
        let json = r#"{
            "_type": "playlist",
            "id": "Test Singer songs",
            "entries": [
                {"id": "a1", "url": "https://www.youtube.com/watch?v=a1", "title": "First"},
                null,
                {"id": "b2", "webpage_url": "https://www.youtube.com/watch?v=b2", "url": "b2"},
                {"title": "No id or url"}
            ]
        }"#;

        let entries = parse_search_output(json.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id.as_deref(), Some("a1"));
        assert_eq!(entries[0].title.as_deref(), Some("First"));
        // webpage_url wins over url
        assert_eq!(
            entries[1].url.as_deref(),
            Some("https://www.youtube.com/watch?v=b2")
        );
        assert!(entries[2].is_blank());
    }

    #[test]
    fn test_parse_missing_entries() {
        let entries = parse_search_output(br#"{"_type": "playlist"}"#).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_search_output(b"ERROR: something").unwrap_err();
        assert!(matches!(err, SearchError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let searcher = YtDlpSearcher::new(&SearchConfig {
            ytdlp_path: PathBuf::from("/nonexistent/yt-dlp"),
            ..SearchConfig::default()
        });
        let err = searcher.search("x songs", 20).await.unwrap_err();
        assert!(matches!(err, SearchError::ToolNotFound { .. }));
    }
}
