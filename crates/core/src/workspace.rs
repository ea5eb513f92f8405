//! Per-run scratch directories.

use std::path::Path;
use tempfile::TempDir;

const DOWNLOADS_DIR: &str = "downloads";
const TRIMMED_DIR: &str = "trimmed";

/// A private directory tree owned by one run.
///
/// Everything under it is removed when the value is dropped, whichever way
/// the run ends.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates `mashup_*` under `root`, or under the system temp dir.
    pub fn create(root: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("mashup_");
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        std::fs::create_dir(dir.path().join(DOWNLOADS_DIR))?;
        std::fs::create_dir(dir.path().join(TRIMMED_DIR))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn downloads_dir(&self) -> std::path::PathBuf {
        self.dir.path().join(DOWNLOADS_DIR)
    }

    pub fn trimmed_dir(&self) -> std::path::PathBuf {
        self.dir.path().join(TRIMMED_DIR)
    }

    /// Removes the tree now, reporting errors instead of ignoring them.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_and_cleanup_on_drop() {
        let root = tempfile::TempDir::new().unwrap();
        let path = {
            let ws = Workspace::create(Some(root.path())).unwrap();
            assert!(ws.downloads_dir().is_dir());
            assert!(ws.trimmed_dir().is_dir());
            assert!(ws
                .path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("mashup_"));
            std::fs::write(ws.downloads_dir().join("a.mp3"), b"x").unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_root_is_created() {
        let root = tempfile::TempDir::new().unwrap();
        let nested = root.path().join("a").join("b");
        let ws = Workspace::create(Some(&nested)).unwrap();
        assert!(ws.path().starts_with(&nested));
        ws.close().unwrap();
        assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 0);
    }

    #[test]
    fn test_concurrent_workspaces_are_distinct() {
        let root = tempfile::TempDir::new().unwrap();
        let a = Workspace::create(Some(root.path())).unwrap();
        let b = Workspace::create(Some(root.path())).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
