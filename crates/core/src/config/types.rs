use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
    #[serde(default = "default_stability")]
    pub stability: PollConfig,
    #[serde(default = "default_lock_wait")]
    pub lock_wait: PollConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: WorkspaceConfig::default(),
            search: SearchConfig::default(),
            download: DownloadConfig::default(),
            transcoder: TranscoderConfig::default(),
            stability: default_stability(),
            lock_wait: default_lock_wait(),
            pipeline: PipelineConfig::default(),
            server: ServerConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

/// Where run workspaces are created.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    /// Parent directory for per-run temp dirs. System temp dir when unset.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Candidate discovery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,
    /// Appended to the singer name to form the search query.
    #[serde(default = "default_query_suffix")]
    pub query_suffix: String,
    /// Results requested per wanted video.
    #[serde(default = "default_oversample_factor")]
    pub oversample_factor: u32,
    /// Lower bound on the number of results requested.
    #[serde(default = "default_min_results")]
    pub min_results: u32,
    /// Timeout for the search invocation in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            query_suffix: default_query_suffix(),
            oversample_factor: default_oversample_factor(),
            min_results: default_min_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_query_suffix() -> String {
    "songs".to_string()
}

fn default_oversample_factor() -> u32 {
    2
}

fn default_min_results() -> u32 {
    20
}

fn default_search_timeout() -> u64 {
    120
}

/// Per-candidate download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// yt-dlp format selector.
    #[serde(default = "default_format")]
    pub format: String,
    /// Codec the audio is extracted to.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    /// Extraction quality in kbps.
    #[serde(default = "default_audio_quality")]
    pub audio_quality_kbps: u32,
    /// Network retries performed by yt-dlp itself.
    #[serde(default = "default_network_retries")]
    pub network_retries: u32,
    /// Timeout for a single download in seconds.
    #[serde(default = "default_download_timeout")]
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            audio_format: default_audio_format(),
            audio_quality_kbps: default_audio_quality(),
            network_retries: default_network_retries(),
            timeout_secs: default_download_timeout(),
        }
    }
}

fn default_format() -> String {
    "bestaudio/best".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> u32 {
    192
}

fn default_network_retries() -> u32 {
    3
}

fn default_download_timeout() -> u64 {
    600
}

/// Transcoder (ffmpeg) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscoderConfig {
    /// Explicit ffmpeg binary. Searched on PATH, then cached/downloaded when unset.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
    /// Cache directory for downloaded ffmpeg builds.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Base URL the platform build is fetched from.
    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,
    /// Expected SHA-256 (hex) of the downloaded build, if pinned.
    #[serde(default)]
    pub download_sha256: Option<String>,
    /// FFmpeg log level.
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,
    /// Encoder used for trimmed clips.
    #[serde(default = "default_clip_codec")]
    pub clip_codec: String,
    /// Bitrate of trimmed clips in kbps.
    #[serde(default = "default_clip_bitrate")]
    pub clip_bitrate_kbps: u32,
    /// Timeout for a single ffmpeg invocation in seconds.
    #[serde(default = "default_transcode_timeout")]
    pub timeout_secs: u64,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            cache_dir: default_cache_dir(),
            download_base_url: default_download_base_url(),
            download_sha256: None,
            ffmpeg_log_level: default_log_level(),
            clip_codec: default_clip_codec(),
            clip_bitrate_kbps: default_clip_bitrate(),
            timeout_secs: default_transcode_timeout(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("mashup-ffmpeg")
}

fn default_download_base_url() -> String {
    "https://github.com/imageio/imageio-binaries/raw/master/ffmpeg".to_string()
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_clip_codec() -> String {
    "libmp3lame".to_string()
}

fn default_clip_bitrate() -> u32 {
    192
}

fn default_transcode_timeout() -> u64 {
    600
}

/// Bounded polling loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl PollConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.delay_ms))
    }
}

fn default_stability() -> PollConfig {
    PollConfig {
        max_attempts: 20,
        delay_ms: 500,
    }
}

fn default_lock_wait() -> PollConfig {
    PollConfig {
        max_attempts: 60,
        delay_ms: 1000,
    }
}

/// Orchestration settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Extra pause between fetching and trimming, in milliseconds.
    #[serde(default)]
    pub settle_delay_ms: u64,
}

/// Web front end configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prefix of the emailed zip name (`<prefix>_mashup.zip`).
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            archive_prefix: default_archive_prefix(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8501
}

fn default_archive_prefix() -> String {
    "mashup".to_string()
}

/// SMTP delivery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_server")]
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Sender address. Falls back to the username, then a no-reply address.
    #[serde(default)]
    pub from: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: default_smtp_server(),
            port: default_smtp_port(),
            username: None,
            password: None,
            from: None,
        }
    }
}

impl SmtpConfig {
    pub fn sender(&self) -> String {
        self.from
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| "no-reply@example.com".to_string())
    }
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub workspace: WorkspaceConfig,
    pub search: SearchConfig,
    pub download: DownloadConfig,
    pub transcoder: TranscoderConfig,
    pub stability: PollConfig,
    pub lock_wait: PollConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
    pub smtp: SanitizedSmtpConfig,
}

/// Sanitized SMTP config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    pub password_configured: bool,
    pub from: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            workspace: config.workspace.clone(),
            search: config.search.clone(),
            download: config.download.clone(),
            transcoder: config.transcoder.clone(),
            stability: config.stability,
            lock_wait: config.lock_wait,
            pipeline: config.pipeline.clone(),
            server: config.server.clone(),
            smtp: SanitizedSmtpConfig {
                server: config.smtp.server.clone(),
                port: config.smtp.port,
                username: config.smtp.username.clone(),
                password_configured: config
                    .smtp
                    .password
                    .as_ref()
                    .is_some_and(|p| !p.is_empty()),
                from: config.smtp.sender(),
            },
        }
    }
}
