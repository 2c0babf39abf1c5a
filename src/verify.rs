//! Read-only audit of manifests against the files on disk.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::FileSystem;
use crate::manifest::{self, Item, Manifest, TargetLayout};

/// Why a video counts as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKind {
    /// The manifest says downloaded, but the file is gone.
    MarkedButMissing,
    /// Never downloaded.
    NotDownloaded,
}

/// A video whose target file does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingVideo {
    /// Expected target path.
    pub path: PathBuf,
    /// Course name.
    pub manifest: String,
    /// Item name.
    pub item: String,
    /// Classification.
    pub kind: MissingKind,
}

impl fmt::Display for MissingVideo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MissingKind::MarkedButMissing => write!(
                f,
                "{} (marked as downloaded but file missing)",
                self.path.display()
            ),
            MissingKind::NotDownloaded => write!(f, "{}", self.path.display()),
        }
    }
}

/// Aggregate result of a verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Video items seen across all manifests.
    pub total: usize,
    /// Videos whose target file exists.
    pub present: usize,
    /// Videos whose target file does not exist.
    pub missing: Vec<MissingVideo>,
    /// Manifests that could not be read or decoded; skipped.
    pub unreadable: Vec<PathBuf>,
}

impl VerifyReport {
    /// Returns true if no video is missing.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Missing videos the manifest claims are downloaded.
    pub fn marked_but_missing(&self) -> impl Iterator<Item = &MissingVideo> {
        self.missing
            .iter()
            .filter(|m| m.kind == MissingKind::MarkedButMissing)
    }

    fn check(&mut self, manifest: &Manifest, present: bool, path: PathBuf, item: &Item) {
        self.total += 1;
        if present {
            self.present += 1;
            return;
        }
        let kind = if item.downloaded {
            MissingKind::MarkedButMissing
        } else {
            MissingKind::NotDownloaded
        };
        self.missing.push(MissingVideo {
            path,
            manifest: manifest.name.clone(),
            item: item.name.clone(),
            kind,
        });
    }
}

/// Checks every video of every manifest in `manifest_dir` against `layout`.
///
/// Nothing is written. Unreadable manifests are logged and listed in the
/// report, then skipped.
///
/// # Errors
///
/// Returns an error only if the manifest directory cannot be listed.
pub async fn verify_manifests<F: FileSystem + ?Sized>(
    fs: &F,
    layout: &TargetLayout,
    manifest_dir: &Path,
) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();

    for path in manifest::discover(manifest_dir).await? {
        let manifest = match Manifest::load(fs, &path).await {
            Ok(manifest) => manifest,
            Err(e) => {
                log::warn!("Could not read {}: {e}", path.display());
                report.unreadable.push(path);
                continue;
            }
        };

        for item in manifest.items.iter().filter(|i| i.is_video()) {
            let target = layout.target_for(&manifest.name, &item.name);
            let present = fs.file_exists(&target).await;
            report.check(&manifest, present, target, item);
        }
    }

    Ok(report)
}
