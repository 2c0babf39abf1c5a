//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use crate::download::{DownloadProgress, Downloader};
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::host::{AssetStream, VideoHost};
use crate::manifest::TargetLayout;
use crate::resolution::ResolutionTable;
use crate::stats::FileStats;

#[derive(Clone)]
enum AssetBehavior {
    Ok(Vec<u8>),
    /// Sends the bytes, then fails the connection.
    Broken(Vec<u8>),
    /// Sends the bytes but declares a larger length.
    Short(Vec<u8>, u64),
}

/// In-memory platform: embed pages by id, asset bodies by URL.
#[derive(Default)]
pub struct MockHost {
    pages: HashMap<String, String>,
    assets: HashMap<String, AssetBehavior>,
    hide_lengths: bool,
    embed_requests: AtomicUsize,
    asset_requests: AtomicUsize,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, id: &str, body: &str) -> Self {
        self.pages.insert(id.to_string(), body.to_string());
        self
    }

    pub fn with_asset(mut self, url: &str, body: &[u8]) -> Self {
        self.assets
            .insert(url.to_string(), AssetBehavior::Ok(body.to_vec()));
        self
    }

    pub fn with_broken_asset(mut self, url: &str, body: &[u8]) -> Self {
        self.assets
            .insert(url.to_string(), AssetBehavior::Broken(body.to_vec()));
        self
    }

    pub fn with_short_asset(mut self, url: &str, body: &[u8], declared: u64) -> Self {
        self.assets
            .insert(url.to_string(), AssetBehavior::Short(body.to_vec(), declared));
        self
    }

    pub const fn without_lengths(mut self) -> Self {
        self.hide_lengths = true;
        self
    }

    pub fn embed_requests(&self) -> usize {
        self.embed_requests.load(Ordering::SeqCst)
    }

    pub fn asset_requests(&self) -> usize {
        self.asset_requests.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.embed_requests() + self.asset_requests()
    }
}

fn not_found(what: &str) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("404 for {what}"),
    ))
}

/// Splits a body into two chunks so progress sees several updates.
fn chunks(body: &[u8]) -> Vec<Result<Bytes>> {
    let mid = body.len() / 2;
    vec![
        Ok(Bytes::copy_from_slice(&body[..mid])),
        Ok(Bytes::copy_from_slice(&body[mid..])),
    ]
}

#[async_trait]
impl VideoHost for MockHost {
    async fn fetch_embed(&self, id: &str) -> Result<String> {
        self.embed_requests.fetch_add(1, Ordering::SeqCst);
        self.pages.get(id).cloned().ok_or_else(|| not_found(id))
    }

    async fn open_asset(&self, url: &str) -> Result<AssetStream> {
        self.asset_requests.fetch_add(1, Ordering::SeqCst);
        let behavior = self.assets.get(url).cloned().ok_or_else(|| not_found(url))?;
        let (length, items) = match behavior {
            AssetBehavior::Ok(body) => (body.len() as u64, chunks(&body)),
            AssetBehavior::Broken(body) => {
                let mut items = chunks(&body);
                items.push(Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                ))));
                (body.len() as u64 * 2, items)
            }
            AssetBehavior::Short(body, declared) => (declared, chunks(&body)),
        };
        Ok(AssetStream {
            content_length: (!self.hide_lengths).then_some(length),
            body: futures::stream::iter(items).boxed(),
        })
    }
}

/// Builds an embed page whose asset list holds the given variants.
pub fn embed_page(variants: &[(u32, &str)]) -> String {
    let assets: Vec<serde_json::Value> = variants
        .iter()
        .map(|(height, url)| {
            serde_json::json!({
                "type": format!("{height}p_mp4"),
                "height": height,
                "url": url,
                "details": {"codecs": ["avc1", "mp4a"]},
            })
        })
        .collect();
    let media = serde_json::json!({"media": {"name": "clip", "assets": assets, "tags": []}});
    format!("<html><script>W.iframeInit({media}, {{}});</script></html>")
}

/// Downloader over a mock host writing under `output_dir`.
pub fn test_downloader(host: MockHost, output_dir: &Path) -> Downloader<MockHost, TokioFileSystem> {
    Downloader::with_parts(
        host,
        TokioFileSystem,
        ResolutionTable::new(),
        TargetLayout::new(output_dir, "mp4"),
    )
}

/// File system whose directory creation and/or atomic writes fail.
#[derive(Default)]
pub struct FailingFs {
    pub fail_dirs: bool,
    pub fail_writes: bool,
}

fn denied() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")
}

#[async_trait]
impl FileSystem for FailingFs {
    async fn file_exists(&self, path: &Path) -> bool {
        TokioFileSystem.file_exists(path).await
    }

    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        if self.fail_dirs {
            return Err(denied());
        }
        TokioFileSystem.create_dir_all(path).await
    }

    async fn create_file(&self, path: &Path) -> std::io::Result<tokio::fs::File> {
        TokioFileSystem.create_file(path).await
    }

    async fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        TokioFileSystem.read_to_string(path).await
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        if self.fail_writes {
            return Err(denied());
        }
        TokioFileSystem.write_atomic(path, contents).await
    }
}

/// Progress sink that records what it was told.
#[derive(Default)]
pub struct RecordingProgress {
    started: Mutex<Vec<Option<u64>>>,
    bytes: AtomicUsize,
    completed: AtomicUsize,
    errors: AtomicUsize,
}

impl RecordingProgress {
    pub fn started(&self) -> Vec<Option<u64>> {
        self.started.lock().unwrap().clone()
    }

    pub fn bytes(&self) -> usize {
        self.bytes.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

impl DownloadProgress for RecordingProgress {
    fn on_file_start(&self, _name: &str, size: Option<u64>) {
        self.started.lock().unwrap().push(size);
    }

    fn on_progress(&self, _name: &str, bytes_delta: u64, _speed: u64) {
        self.bytes
            .fetch_add(usize::try_from(bytes_delta).unwrap(), Ordering::SeqCst);
    }

    fn on_file_complete(&self, _name: &str, _stats: &FileStats) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, _name: &str, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}
