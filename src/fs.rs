//! File system abstraction for testability.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Abstraction over file system operations for testability.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Checks if a file exists at the given path.
    async fn file_exists(&self, path: &Path) -> bool;

    /// Creates all directories in the given path.
    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()>;

    /// Creates or truncates a file for writing.
    async fn create_file(&self, path: &Path) -> std::io::Result<tokio::fs::File>;

    /// Reads a whole file as UTF-8.
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// Replaces the contents of `path` so that readers see either the old
    /// contents or the new ones, never a partial write.
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> std::io::Result<()>;
}

/// Returns the sibling temp path used by [`FileSystem::write_atomic`].
#[must_use]
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Default file system implementation using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    /// Creates a new `TokioFileSystem` instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn file_exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
    }

    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn create_file(&self, path: &Path) -> std::io::Result<tokio::fs::File> {
        tokio::fs::File::create(path).await
    }

    async fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        let tmp = tmp_path(path);
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[tokio::test]
    async fn tokio_fs_file_exists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.txt");
        std::fs::File::create(&path).unwrap();

        let fs = TokioFileSystem::new();
        assert!(fs.file_exists(&path).await);
        assert!(!fs.file_exists(&dir.path().join("nonexistent.txt")).await);
    }

    #[tokio::test]
    async fn directories_are_not_files() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFileSystem::new();
        assert!(!fs.file_exists(dir.path()).await);
    }

    #[tokio::test]
    async fn create_file_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("video.mp4");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"stale partial data")
            .unwrap();

        let fs = TokioFileSystem::new();
        let file = fs.create_file(&path).await.unwrap();
        drop(file);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn write_atomic_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("course.json");
        std::fs::write(&path, "old").unwrap();

        let fs = TokioFileSystem::new();
        fs.write_atomic(&path, b"new contents").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new contents");
        assert!(!tmp_path(&path).exists());
    }

    #[tokio::test]
    async fn write_atomic_into_missing_dir_fails_without_touching_target() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("course.json");

        let fs = TokioFileSystem::new();
        assert!(fs.write_atomic(&path, b"x").await.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path(Path::new("jsons/a.json")),
            PathBuf::from("jsons/a.json.tmp")
        );
    }

    #[tokio::test]
    async fn tokio_fs_create_dir_all() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");

        let fs = TokioFileSystem::new();
        fs.create_dir_all(&nested).await.unwrap();
        assert!(nested.exists());
    }
}
