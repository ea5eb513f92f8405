//! FFmpeg resolution: configured path, search path, cache, then download.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::types::{Backend, LocatorError, Platform};
use crate::config::TranscoderConfig;

/// Resolves a working transcoder.
#[async_trait]
pub trait BackendLocator: Send + Sync {
    /// Returns the same backend on every call once resolution succeeded.
    async fn locate(&self) -> Result<Backend, LocatorError>;
}

/// Obtains a platform build of ffmpeg.
#[async_trait]
pub trait BinaryFetcher: Send + Sync {
    /// Writes the executable for `asset` to `dest`.
    async fn fetch(&self, asset: &str, dest: &Path) -> Result<(), LocatorError>;
}

/// Downloads builds over HTTP from a base URL.
pub struct HttpBinaryFetcher {
    client: reqwest::Client,
    base_url: String,
    expected_sha256: Option<String>,
}

impl HttpBinaryFetcher {
    pub fn new(base_url: impl Into<String>, expected_sha256: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            expected_sha256,
        }
    }

    fn asset_url(&self, asset: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), asset)
    }
}

#[async_trait]
impl BinaryFetcher for HttpBinaryFetcher {
    async fn fetch(&self, asset: &str, dest: &Path) -> Result<(), LocatorError> {
        let url = self.asset_url(asset);
        info!("Downloading ffmpeg build from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| LocatorError::DownloadFailed(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LocatorError::DownloadFailed(e.to_string()))?;

        if let Some(expected) = &self.expected_sha256 {
            verify_checksum(&bytes, expected)?;
        }

        install_executable(&bytes, dest).await
    }
}

/// Compares the SHA-256 of `bytes` against a hex digest (case-insensitive).
pub fn verify_checksum(bytes: &[u8], expected: &str) -> Result<(), LocatorError> {
    let actual = format!("{:x}", Sha256::digest(bytes));
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(LocatorError::ChecksumMismatch {
            expected: expected.trim().to_lowercase(),
            actual,
        })
    }
}

/// Stages `bytes` in a uniquely named file next to `dest`, marks it
/// executable and renames it into place.
///
/// Concurrent installs into the same `dest` each stage privately; the last
/// rename wins. The staging file is removed on every error path.
pub async fn install_executable(bytes: &[u8], dest: &Path) -> Result<(), LocatorError> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&parent).await?;

    let bytes = bytes.to_vec();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || stage_and_persist(&bytes, &parent, &dest))
        .await
        .map_err(|e| LocatorError::Io(std::io::Error::other(e)))?
}

fn stage_and_persist(bytes: &[u8], parent: &Path, dest: &Path) -> Result<(), LocatorError> {
    let mut staged = tempfile::Builder::new()
        .prefix(".ffmpeg_")
        .tempfile_in(parent)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o755))?;
    }

    // The returned handle is dropped at once; an open writer blocks exec.
    staged.persist(dest).map_err(|e| LocatorError::Io(e.error))?;
    Ok(())
}

/// Default [`BackendLocator`].
pub struct FfmpegLocator {
    config: TranscoderConfig,
    platform: Platform,
    search_path: Option<OsString>,
    fetcher: Arc<dyn BinaryFetcher>,
    resolved: OnceCell<Backend>,
}

impl FfmpegLocator {
    /// Uses the process `PATH` captured now and downloads over HTTP.
    pub fn new(config: TranscoderConfig) -> Self {
        let fetcher = Arc::new(HttpBinaryFetcher::new(
            config.download_base_url.clone(),
            config.download_sha256.clone(),
        ));
        Self {
            config,
            platform: Platform::current(),
            search_path: std::env::var_os("PATH"),
            fetcher,
            resolved: OnceCell::new(),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn BinaryFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_search_path(mut self, search_path: Option<OsString>) -> Self {
        self.search_path = search_path;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    fn backend(&self, path: PathBuf) -> Backend {
        Backend::new(path, self.search_path.as_deref())
    }

    fn find_on_search_path(&self, name: &Path) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        std::env::split_paths(search_path)
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    fn cached_path(&self, asset: &str) -> PathBuf {
        self.config
            .cache_dir
            .join(asset)
            .join(self.platform.executable_name())
    }

    async fn resolve(&self) -> Result<Backend, LocatorError> {
        if let Some(configured) = &self.config.ffmpeg_path {
            let path = if configured.components().count() > 1 || configured.is_absolute() {
                configured.clone()
            } else {
                self.find_on_search_path(configured)
                    .unwrap_or_else(|| configured.clone())
            };
            if !path.is_file() {
                return Err(LocatorError::NotFound { path });
            }
            verify_binary(&path).await?;
            info!("Using configured ffmpeg at {:?}", path);
            return Ok(self.backend(path));
        }

        if let Some(path) = self.find_on_search_path(Path::new(self.platform.executable_name())) {
            match verify_binary(&path).await {
                Ok(()) => {
                    info!("Using ffmpeg from search path at {:?}", path);
                    return Ok(self.backend(path));
                }
                Err(e) => warn!("Ignoring ffmpeg at {:?}: {}", path, e),
            }
        }

        let asset = self
            .platform
            .asset_name()
            .ok_or_else(|| LocatorError::UnsupportedPlatform {
                os: self.platform.os.to_string(),
                arch: self.platform.arch.to_string(),
            })?;
        let cached = self.cached_path(asset);

        if cached.is_file() {
            match verify_binary(&cached).await {
                Ok(()) => {
                    info!("Using cached ffmpeg at {:?}", cached);
                    return Ok(self.backend(cached));
                }
                Err(e) => warn!("Cached ffmpeg at {:?} is broken, refetching: {}", cached, e),
            }
        }

        self.fetcher.fetch(asset, &cached).await?;
        verify_binary(&cached).await?;
        info!("Installed ffmpeg at {:?}", cached);
        Ok(self.backend(cached))
    }
}

#[async_trait]
impl BackendLocator for FfmpegLocator {
    async fn locate(&self) -> Result<Backend, LocatorError> {
        self.resolved
            .get_or_try_init(|| self.resolve())
            .await
            .cloned()
    }
}

/// Runs `<path> -version` and expects a zero exit.
async fn verify_binary(path: &Path) -> Result<(), LocatorError> {
    let unusable = |reason: String| LocatorError::Unusable {
        path: path.to_path_buf(),
        reason,
    };

    let output = tokio::time::timeout(
        Duration::from_secs(30),
        tokio::process::Command::new(path)
            .arg("-version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| unusable("timed out running -version".to_string()))?
    .map_err(|e| unusable(e.to_string()))?;

    if !output.status.success() {
        return Err(unusable(format!(
            "-version exited with code {:?}",
            output.status.code()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    debug!("{}", stdout.lines().next().unwrap_or_default());
    Ok(())
}
