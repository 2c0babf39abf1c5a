//! Transfer statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Statistics for a single completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    /// Bytes written to disk.
    pub bytes: u64,
    /// Time taken by the transfer.
    pub elapsed: Duration,
    /// Average speed in bytes per second.
    pub average_speed: u64,
}

/// Totals for a run over one or more videos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Videos downloaded in this run.
    pub files_downloaded: usize,
    /// Bytes downloaded in this run.
    pub total_bytes: u64,
    /// Time spent transferring.
    pub elapsed: Duration,
}

impl SessionStats {
    /// Creates empty stats.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            files_downloaded: 0,
            total_bytes: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Adds one completed download.
    pub fn add_download(&mut self, file: &FileStats) {
        self.files_downloaded += 1;
        self.total_bytes += file.bytes;
        self.elapsed += file.elapsed;
    }

    /// Folds another run's totals into this one.
    pub fn merge(&mut self, other: &Self) {
        self.files_downloaded += other.files_downloaded;
        self.total_bytes += other.total_bytes;
        self.elapsed += other.elapsed;
    }

    /// Average speed across all transfers in bytes per second.
    #[must_use]
    pub fn average_speed(&self) -> u64 {
        speed(self.total_bytes, self.elapsed)
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn speed(bytes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (bytes as f64 / secs) as u64
    } else {
        0
    }
}

/// Tracks bytes of one in-flight transfer.
///
/// Shared by reference with the body stream, so counters are atomic.
pub struct DownloadStatsTracker {
    start_time: Instant,
    downloaded: AtomicU64,
}

impl DownloadStatsTracker {
    /// Starts tracking a transfer now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            downloaded: AtomicU64::new(0),
        }
    }

    /// Records a chunk and returns the current average speed.
    pub fn record_bytes(&self, bytes: u64) -> u64 {
        let total = self.downloaded.fetch_add(bytes, Ordering::Relaxed) + bytes;
        speed(total, self.start_time.elapsed())
    }

    /// Bytes recorded so far.
    #[must_use]
    pub fn downloaded(&self) -> u64 {
        self.downloaded.load(Ordering::Relaxed)
    }

    /// Final statistics for the transfer.
    #[must_use]
    pub fn finish(&self) -> FileStats {
        let elapsed = self.start_time.elapsed();
        let bytes = self.downloaded();
        FileStats {
            bytes,
            elapsed,
            average_speed: speed(bytes, elapsed),
        }
    }
}

impl Default for DownloadStatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
