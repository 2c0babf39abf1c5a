//! Batch processing of course manifests with incremental progress.
//!
//! The manifest on disk is the only record of progress. It is rewritten
//! after every successful video, never before the file is fully written,
//! so an interrupted run loses at most the item in flight.

use std::path::{Path, PathBuf};

use crate::download::{DownloadProgress, Downloader};
use crate::error::Result;
use crate::fs::FileSystem;
use crate::host::VideoHost;
use crate::manifest::{self, Manifest};
use crate::stats::SessionStats;

/// Outcome of processing one manifest.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Course name.
    pub manifest: String,
    /// Items downloaded in this run.
    pub downloaded: Vec<String>,
    /// Video items already marked downloaded.
    pub already_done: usize,
    /// Non-video items, left untouched.
    pub non_video: usize,
    /// Items that could not be downloaded.
    pub failed: Vec<String>,
    /// Items downloaded whose progress could not be saved.
    pub unsaved: Vec<String>,
    /// Transfer totals.
    pub stats: SessionStats,
}

impl BatchReport {
    /// Returns true if every pending video was downloaded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A manifest file that did not complete.
#[derive(Debug, Clone)]
pub struct FailedManifest {
    /// Path of the manifest file.
    pub path: PathBuf,
    /// Why it failed.
    pub reason: String,
}

/// Outcome of processing every manifest in a directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryReport {
    /// Per-manifest reports for manifests that could be loaded.
    pub manifests: Vec<BatchReport>,
    /// Manifests that failed to load or had failed items.
    pub failed_files: Vec<FailedManifest>,
}

impl DirectoryReport {
    /// Returns true if every manifest completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_files.is_empty()
    }

    /// Combined transfer totals.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let mut total = SessionStats::new();
        for report in &self.manifests {
            total.merge(&report.stats);
        }
        total
    }
}

impl<H: VideoHost, F: FileSystem> Downloader<H, F> {
    /// Downloads every pending video of the manifest at `path`.
    ///
    /// Failures of single items are recorded and the batch continues.
    ///
    /// # Errors
    ///
    /// Returns an error only if the manifest itself cannot be loaded.
    pub async fn run_manifest(
        &self,
        path: &Path,
        progress: &dyn DownloadProgress,
    ) -> Result<BatchReport> {
        let mut manifest = Manifest::load(&self.fs, path).await?;
        let mut report = BatchReport {
            manifest: manifest.name.clone(),
            ..BatchReport::default()
        };
        log::info!(
            "{}: {} video(s), {} pending",
            manifest.name,
            manifest.video_count(),
            manifest.pending_count()
        );

        let course_dir = self.layout.course_dir(&manifest.name);
        for idx in 0..manifest.items.len() {
            let item = &manifest.items[idx];
            if !item.is_video() {
                report.non_video += 1;
                continue;
            }
            if item.downloaded {
                report.already_done += 1;
                continue;
            }
            let name = item.name.clone();
            let id = item.dynamic_part.clone();

            if let Err(e) = self.fs.create_dir_all(&course_dir).await {
                log::warn!(
                    "Error creating {} for {name}: {e}; skipping",
                    course_dir.display()
                );
                report.failed.push(name);
                continue;
            }

            let dest = self.layout.target_for(&manifest.name, &name);
            match self.download_video(&id, None, &dest, &name, progress).await {
                Ok(fetched) => {
                    log::info!("Downloaded {name} at {}", fetched.resolution);
                    report.stats.add_download(&fetched.stats);
                }
                Err(e) => {
                    log::warn!("Failed to download {name}: {e}; skipping to next video");
                    report.failed.push(name);
                    continue;
                }
            }

            manifest.items[idx].downloaded = true;
            if let Err(e) = manifest.save(&self.fs, path).await {
                log::warn!("Could not save progress for {name}: {e}");
                report.unsaved.push(name.clone());
            }
            report.downloaded.push(name);
        }

        Ok(report)
    }

    /// Runs [`run_manifest`](Self::run_manifest) for every `*.json` file in
    /// `dir`, in path order, continuing past failures.
    ///
    /// # Errors
    ///
    /// Returns an error only if the directory cannot be listed.
    pub async fn run_manifest_dir(
        &self,
        dir: &Path,
        progress: &dyn DownloadProgress,
    ) -> Result<DirectoryReport> {
        let paths = manifest::discover(dir).await?;
        let mut report = DirectoryReport::default();

        for (i, path) in paths.iter().enumerate() {
            log::info!("Processing file {}/{}: {}", i + 1, paths.len(), path.display());
            match self.run_manifest(path, progress).await {
                Ok(batch) => {
                    if !batch.is_success() {
                        report.failed_files.push(FailedManifest {
                            path: path.clone(),
                            reason: format!("{} video(s) failed to download", batch.failed.len()),
                        });
                    }
                    report.manifests.push(batch);
                }
                Err(e) => {
                    log::warn!("Error processing {}: {e}; continuing", path.display());
                    report.failed_files.push(FailedManifest {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
