//! wisty-dl - download videos from an embedded video-hosting platform.
//!
//! Videos are addressed by opaque ids. For each id the platform's embed page
//! is fetched, the list of encoded variants is extracted from it, and the
//! best available resolution is streamed to disk. Course manifests drive
//! batch runs and record per-item completion, so an interrupted run resumes
//! where it stopped.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use wisty_dl::{AppConfig, Downloader, NoProgress};
//!
//! # async fn example() -> wisty_dl::Result<()> {
//! let downloader = Downloader::from_config(&AppConfig::default())?;
//!
//! // Download every pending video of one course
//! let report = downloader
//!     .run_manifest(Path::new("jsons/course.json"), &NoProgress)
//!     .await?;
//! println!("Downloaded {} videos", report.downloaded.len());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod batch;
pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod format;
pub mod fs;
pub mod host;
pub mod manifest;
pub mod resolution;
pub mod stats;
pub mod verify;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use batch::{BatchReport, DirectoryReport, FailedManifest};
pub use catalog::{AssetVariant, Catalog, extract_catalog};
pub use config::{AppConfig, DownloadConfig, NetworkConfig, PathConfig};
pub use download::{DownloadProgress, Downloader, Fetched, NoProgress};
pub use error::{Error, Result};
pub use format::{format_bytes, format_duration};
pub use fs::{FileSystem, TokioFileSystem};
pub use host::{HttpHost, VideoHost};
pub use manifest::{Item, Manifest, TargetLayout};
pub use resolution::{Resolution, ResolutionTable};
pub use stats::{FileStats, SessionStats};
pub use verify::{MissingKind, MissingVideo, VerifyReport, verify_manifests};
