//! Mashup assembly.
//!
//! Joins trimmed clips, in order, into the final output through the
//! transcoder's stream-copy concatenation. The concat manifest lives in a
//! private temp file next to the output and is removed on every path.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::MashupError;
use crate::transcoder::{ConcatJob, TranscodeError, Transcoder};
use crate::trimmer::TrimmedClip;

/// One manifest line for `path`, quoted for the ffmpeg concat demuxer.
pub fn manifest_line(path: &Path) -> String {
    format!("file '{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

/// Renders the manifest for `clips` with absolute paths, one per line.
pub fn render_manifest(clips: &[TrimmedClip]) -> std::io::Result<String> {
    let mut manifest = String::new();
    for clip in clips {
        let absolute = std::path::absolute(&clip.local_path)?;
        manifest.push_str(&manifest_line(&absolute));
        manifest.push('\n');
    }
    Ok(manifest)
}

/// Concatenates `clips` into `output_path` and returns it.
pub async fn merge(
    transcoder: &dyn Transcoder,
    backend: &Backend,
    clips: &[TrimmedClip],
    output_path: &Path,
) -> Result<PathBuf, MashupError> {
    if clips.is_empty() {
        return Err(MashupError::NoClipsToMerge);
    }

    let parent = match output_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&parent).await.map_err(|_| {
        MashupError::MergeFailed(TranscodeError::OutputDirectoryFailed {
            path: parent.clone(),
        })
    })?;

    let manifest = write_manifest(clips, &parent).map_err(|e| MashupError::MergeFailed(e.into()))?;
    debug!("Wrote concat manifest {:?} for {} clips", manifest, clips.len());

    let job = ConcatJob {
        manifest_path: manifest.to_path_buf(),
        output_path: output_path.to_path_buf(),
    };
    let result = transcoder.concat(backend, &job).await;

    if let Err(e) = manifest.close() {
        warn!("Failed to remove concat manifest: {}", e);
    }

    result.map_err(MashupError::MergeFailed)?;
    info!(clips = clips.len(), "Merged mashup into {:?}", output_path);
    Ok(output_path.to_path_buf())
}

fn write_manifest(clips: &[TrimmedClip], dir: &Path) -> std::io::Result<tempfile::TempPath> {
    let contents = render_manifest(clips)?;
    let mut file = tempfile::Builder::new()
        .prefix(".mashup_concat_")
        .suffix(".txt")
        .tempfile_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}
