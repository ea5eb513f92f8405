//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::error::TranscodeError;
use super::traits::Transcoder;
use super::types::{ConcatJob, TrimJob};
use crate::backend::Backend;
use crate::config::TranscoderConfig;

/// Lines of ffmpeg stderr kept in error reports.
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg-based transcoder.
pub struct FfmpegTranscoder {
    log_level: String,
    timeout_secs: u64,
}

impl FfmpegTranscoder {
    pub fn new(config: &TranscoderConfig) -> Self {
        Self {
            log_level: config.ffmpeg_log_level.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(&TranscoderConfig::default())
    }

    fn common_args(&self) -> Vec<String> {
        vec![
            "-y".to_string(), // Overwrite output
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.log_level.clone(),
        ]
    }

    /// Builds ffmpeg arguments for a leading-window trim.
    fn build_trim_args(&self, job: &TrimJob) -> Vec<String> {
        let mut args = self.common_args();

        // Seek before the input so ffmpeg skips decoding the lead-in
        args.extend([
            "-ss".to_string(),
            job.start_secs.to_string(),
            "-t".to_string(),
            job.duration_secs.to_string(),
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
        ]);

        // Drop cover art / video
        args.push("-vn".to_string());

        args.extend([
            "-c:a".to_string(),
            job.codec.clone(),
            "-b:a".to_string(),
            format!("{}k", job.bitrate_kbps),
        ]);

        args.push(job.output_path.to_string_lossy().to_string());
        args
    }

    /// Builds ffmpeg arguments for concat-demuxer stream copy.
    fn build_concat_args(&self, job: &ConcatJob) -> Vec<String> {
        let mut args = self.common_args();
        args.extend([
            "-f".to_string(),
            "concat".to_string(),
            // Manifest entries are absolute paths
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            job.manifest_path.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            job.output_path.to_string_lossy().to_string(),
        ]);
        args
    }

    /// Runs ffmpeg and checks that `output_path` was produced.
    async fn run(
        &self,
        backend: &Backend,
        args: &[String],
        output_path: &Path,
    ) -> Result<(), TranscodeError> {
        let start = Instant::now();

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                TranscodeError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        debug!("Running {:?} {:?}", backend.ffmpeg_path(), args);

        let child = backend
            .command(backend.ffmpeg_path())
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: backend.ffmpeg_path().to_path_buf(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        // Dropping the future on timeout kills the child
        let output = match timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(TranscodeError::Timeout {
                    timeout_secs: self.timeout_secs,
                })
            }
        };

        if !output.status.success() {
            return Err(TranscodeError::failed(
                format!("FFmpeg exited with code: {:?}", output.status.code()),
                stderr_tail(&output.stderr),
            ));
        }

        if tokio::fs::metadata(output_path).await.is_err() {
            return Err(TranscodeError::failed("Output file not created", None));
        }

        debug!(
            "FFmpeg wrote {:?} in {} ms",
            output_path,
            start.elapsed().as_millis()
        );
        Ok(())
    }
}

fn stderr_tail(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return None;
    }
    let skip = lines.len().saturating_sub(STDERR_TAIL_LINES);
    Some(lines[skip..].join("\n"))
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn trim(&self, backend: &Backend, job: &TrimJob) -> Result<(), TranscodeError> {
        if !job.input_path.exists() {
            return Err(TranscodeError::InputNotFound {
                path: job.input_path.clone(),
            });
        }
        let args = self.build_trim_args(job);
        self.run(backend, &args, &job.output_path).await
    }

    async fn concat(&self, backend: &Backend, job: &ConcatJob) -> Result<(), TranscodeError> {
        if !job.manifest_path.exists() {
            return Err(TranscodeError::InputNotFound {
                path: job.manifest_path.clone(),
            });
        }
        let args = self.build_concat_args(job);
        self.run(backend, &args, &job.output_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn trim_job(input: &Path, output: &Path) -> TrimJob {
        TrimJob {
            input_path: input.to_path_buf(),
            output_path: output.to_path_buf(),
            start_secs: 0,
            duration_secs: 25,
            codec: "libmp3lame".to_string(),
            bitrate_kbps: 192,
        }
    }

    fn position(args: &[String], flag: &str) -> usize {
        args.iter().position(|a| a == flag).unwrap()
    }

    #[test]
    fn test_build_trim_args() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_trim_args(&trim_job(
            Path::new("/work/downloads/abc.mp3"),
            Path::new("/work/trimmed/abc_trimmed.mp3"),
        ));

        assert_eq!(args[position(&args, "-ss") + 1], "0");
        assert_eq!(args[position(&args, "-t") + 1], "25");
        assert_eq!(args[position(&args, "-i") + 1], "/work/downloads/abc.mp3");
        assert_eq!(args[position(&args, "-c:a") + 1], "libmp3lame");
        assert_eq!(args[position(&args, "-b:a") + 1], "192k");
        assert_eq!(args[position(&args, "-loglevel") + 1], "error");
        assert!(args.contains(&"-vn".to_string()));
        // Window options apply to the input
        assert!(position(&args, "-t") < position(&args, "-i"));
        assert_eq!(args.last().unwrap(), "/work/trimmed/abc_trimmed.mp3");
    }

    #[test]
    fn test_build_concat_args() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.build_concat_args(&ConcatJob {
            manifest_path: PathBuf::from("/out/list.txt"),
            output_path: PathBuf::from("/out/mashup.mp3"),
        });

        assert_eq!(args[position(&args, "-f") + 1], "concat");
        assert_eq!(args[position(&args, "-safe") + 1], "0");
        assert_eq!(args[position(&args, "-i") + 1], "/out/list.txt");
        assert_eq!(args[position(&args, "-c") + 1], "copy");
        assert!(!args.contains(&"-c:a".to_string()));
        assert_eq!(args.last().unwrap(), "/out/mashup.mp3");
    }

    #[test]
    fn test_stderr_tail() {
        assert_eq!(stderr_tail(b""), None);
        assert_eq!(stderr_tail(b"\n  \n"), None);

        let many: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(many.as_bytes()).unwrap();
        assert_eq!(tail.lines().count(), STDERR_TAIL_LINES);
        assert!(tail.ends_with("line 29"));
    }

    #[tokio::test]
    async fn test_trim_missing_input() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let backend = Backend::new("ffmpeg", None);
        let err = transcoder
            .trim(
                &backend,
                &trim_job(Path::new("/nonexistent/in.mp3"), Path::new("/tmp/out.mp3")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::InputNotFound { .. }));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::backend::install_executable;
        use tempfile::TempDir;

        // Writes its last argument, like ffmpeg writes its output
        const WRITES_OUTPUT: &[u8] = b"#!/bin/sh\nfor last; do :; done\nprintf clip > \"$last\"\n";
        const FAILS: &[u8] = b"#!/bin/sh\necho 'Invalid data found when processing input' >&2\nexit 1\n";
        const WRITES_NOTHING: &[u8] = b"#!/bin/sh\nexit 0\n";

        async fn fake_backend(dir: &Path, script: &[u8]) -> Backend {
            let path = dir.join("bin").join("ffmpeg");
            install_executable(script, &path).await.unwrap();
            Backend::new(path, None)
        }

        #[tokio::test]
        async fn test_trim_runs_ffmpeg() {
            let temp = TempDir::new().unwrap();
            let backend = fake_backend(temp.path(), WRITES_OUTPUT).await;
            let input = temp.path().join("in.mp3");
            std::fs::write(&input, b"audio").unwrap();
            let output = temp.path().join("trimmed").join("in_trimmed.mp3");

            FfmpegTranscoder::with_defaults()
                .trim(&backend, &trim_job(&input, &output))
                .await
                .unwrap();

            assert_eq!(std::fs::read(&output).unwrap(), b"clip");
        }

        #[tokio::test]
        async fn test_failure_captures_stderr() {
            let temp = TempDir::new().unwrap();
            let backend = fake_backend(temp.path(), FAILS).await;
            let input = temp.path().join("in.mp3");
            std::fs::write(&input, b"audio").unwrap();

            let err = FfmpegTranscoder::with_defaults()
                .trim(&backend, &trim_job(&input, &temp.path().join("out.mp3")))
                .await
                .unwrap_err();

            assert!(matches!(err, TranscodeError::Failed { .. }));
            assert!(err.stderr().unwrap().contains("Invalid data"));
        }

        #[tokio::test]
        async fn test_missing_output_is_failure() {
            let temp = TempDir::new().unwrap();
            let backend = fake_backend(temp.path(), WRITES_NOTHING).await;
            let manifest = temp.path().join("list.txt");
            std::fs::write(&manifest, b"file '/a.mp3'\n").unwrap();

            let err = FfmpegTranscoder::with_defaults()
                .concat(
                    &backend,
                    &ConcatJob {
                        manifest_path: manifest,
                        output_path: temp.path().join("out.mp3"),
                    },
                )
                .await
                .unwrap_err();

            assert!(matches!(err, TranscodeError::Failed { .. }));
        }

        #[tokio::test]
        async fn test_missing_binary() {
            let temp = TempDir::new().unwrap();
            let backend = Backend::new(temp.path().join("no-ffmpeg"), None);
            let input = temp.path().join("in.mp3");
            std::fs::write(&input, b"audio").unwrap();

            let err = FfmpegTranscoder::with_defaults()
                .trim(&backend, &trim_job(&input, &temp.path().join("out.mp3")))
                .await
                .unwrap_err();

            assert!(matches!(err, TranscodeError::FfmpegNotFound { .. }));
        }
    }
}
