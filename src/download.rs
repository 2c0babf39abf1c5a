//! Streaming downloads and the resolution fallback chain.

use std::path::Path;

use futures::TryStreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

use crate::catalog::{Catalog, extract_catalog};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::host::{AssetStream, HttpHost, VideoHost};
use crate::manifest::TargetLayout;
use crate::resolution::{self, Resolution, ResolutionTable};
use crate::stats::{DownloadStatsTracker, FileStats};

/// Trait for receiving download progress updates.
///
/// All methods have default no-op implementations for convenience.
pub trait DownloadProgress: Send + Sync {
    /// Called when a transfer starts. `size` is `None` when the server
    /// declares no length.
    fn on_file_start(&self, _name: &str, _size: Option<u64>) {}

    /// Called for every received chunk.
    fn on_progress(&self, _name: &str, _bytes_delta: u64, _speed: u64) {}

    /// Called when a transfer completes successfully.
    fn on_file_complete(&self, _name: &str, _stats: &FileStats) {}

    /// Called when a transfer fails.
    fn on_error(&self, _name: &str, _error: &str) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl DownloadProgress for NoProgress {}

/// Outcome of a successful fallback chain.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Resolution that was downloaded.
    pub resolution: Resolution,
    /// Transfer statistics.
    pub stats: FileStats,
}

/// Resolves and downloads videos from the platform.
pub struct Downloader<H: VideoHost = HttpHost, F: FileSystem = TokioFileSystem> {
    pub(crate) host: H,
    pub(crate) fs: F,
    pub(crate) resolutions: ResolutionTable,
    pub(crate) layout: TargetLayout,
}

impl Downloader<HttpHost, TokioFileSystem> {
    /// Creates a downloader talking to the real platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::with_parts(
            HttpHost::new(&config.network)?,
            TokioFileSystem,
            config.download.resolution_table(),
            config.layout(),
        ))
    }
}

impl<H: VideoHost, F: FileSystem> Downloader<H, F> {
    /// Creates a downloader from explicit parts.
    #[must_use]
    pub const fn with_parts(
        host: H,
        fs: F,
        resolutions: ResolutionTable,
        layout: TargetLayout,
    ) -> Self {
        Self {
            host,
            fs,
            resolutions,
            layout,
        }
    }

    /// Returns the resolution table.
    #[must_use]
    pub const fn resolutions(&self) -> &ResolutionTable {
        &self.resolutions
    }

    /// Returns the target layout.
    #[must_use]
    pub const fn layout(&self) -> &TargetLayout {
        &self.layout
    }

    /// Queries the platform for the quality variants of `id`.
    ///
    /// # Errors
    ///
    /// Transport errors propagate; see [`extract_catalog`] for parse errors.
    pub async fn fetch_catalog(&self, id: &str) -> Result<Catalog> {
        let body = self.host.fetch_embed(id).await?;
        let catalog = extract_catalog(&body)?;
        log::debug!(
            "Catalog for {id}: {}",
            catalog
                .resolutions()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(catalog)
    }

    /// Streams `url` into `dest`, truncating any existing file.
    ///
    /// On failure the destination is left partial; callers must not treat
    /// it as downloaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written, the transfer fails,
    /// or the body is shorter than the declared length.
    pub async fn download_asset(
        &self,
        url: &str,
        dest: &Path,
        name: &str,
        progress: &dyn DownloadProgress,
    ) -> Result<FileStats> {
        let result = self.transfer(url, dest, name, progress).await;
        match &result {
            Ok(stats) => progress.on_file_complete(name, stats),
            Err(e) => progress.on_error(name, &e.to_string()),
        }
        result
    }

    async fn transfer(
        &self,
        url: &str,
        dest: &Path,
        name: &str,
        progress: &dyn DownloadProgress,
    ) -> Result<FileStats> {
        let mut file = self.fs.create_file(dest).await?;
        let AssetStream {
            content_length,
            body,
        } = self.host.open_asset(url).await?;

        progress.on_file_start(name, content_length);
        let tracker = DownloadStatsTracker::new();

        let body = body
            .inspect_ok(|chunk| {
                let delta = chunk.len() as u64;
                let speed = tracker.record_bytes(delta);
                progress.on_progress(name, delta, speed);
            })
            .map_err(std::io::Error::other);
        let mut reader = StreamReader::new(body);

        let received = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;

        if let Some(expected) = content_length
            && received < expected
        {
            return Err(Error::Truncated { expected, received });
        }
        Ok(tracker.finish())
    }

    /// Downloads video `id` to `dest`, walking the fallback chain.
    ///
    /// With `requested`, only that resolution is attempted. Otherwise the
    /// catalog's own heights are tried from highest to lowest, or the
    /// table's fixed order if the catalog cannot be discovered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] when no candidate succeeds.
    pub async fn download_video(
        &self,
        id: &str,
        requested: Option<Resolution>,
        dest: &Path,
        name: &str,
        progress: &dyn DownloadProgress,
    ) -> Result<Fetched> {
        let (mut catalog, candidates) = match requested {
            Some(resolution) => (None, vec![resolution]),
            None => match self.fetch_catalog(id).await {
                Ok(catalog) => {
                    let candidates = catalog.resolutions();
                    (Some(catalog), candidates)
                }
                Err(e) => {
                    log::warn!(
                        "Could not get available resolutions for {name}: {e}; falling back to default list"
                    );
                    (None, self.resolutions.fallback_order())
                }
            },
        };

        let mut tried = Vec::with_capacity(candidates.len());
        for resolution in candidates {
            tried.push(resolution);
            log::info!("Trying {resolution} for {name}");

            if catalog.is_none() {
                match self.fetch_catalog(id).await {
                    Ok(fresh) => catalog = Some(fresh),
                    Err(e) => {
                        log::warn!("{resolution} for {name}: {e}");
                        continue;
                    }
                }
            }
            let Some(current) = catalog.as_ref() else {
                continue;
            };

            if !self.resolutions.contains(resolution) {
                log::debug!("{resolution} is not in the resolution table; trying it anyway");
            }
            let asset = match resolution::select(current, resolution) {
                Ok(asset) => asset,
                Err(e) => {
                    log::info!("{e} for {name}, trying next resolution");
                    continue;
                }
            };

            match self.download_asset(&asset.url, dest, name, progress).await {
                Ok(stats) => return Ok(Fetched { resolution, stats }),
                Err(e) => log::warn!("Downloading {name} at {resolution} failed: {e}"),
            }
        }

        Err(Error::Exhausted {
            id: id.to_string(),
            tried,
        })
    }
}
