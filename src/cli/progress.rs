//! Progress bars and summary reporting for CLI downloads.

use std::sync::Mutex;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::{BatchReport, DirectoryReport};
use crate::download::DownloadProgress;
use crate::format::{format_bytes, format_duration};
use crate::stats::{FileStats, SessionStats};
use crate::verify::{MissingKind, VerifyReport};

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Creates a progress bar for a download of known size.
fn make_progress_bar(size: u64, name: &str) -> ProgressBar {
    let bar = ProgressBar::new(size);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} @ {bytes_per_sec} - {msg}",
        )
        .expect("progress template is valid")
        .progress_chars("━━╌"),
    );
    bar.set_message(name.to_string());
    bar
}

/// Creates a spinner for a download whose size was not declared.
fn make_spinner(name: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {bytes} @ {bytes_per_sec} - {msg}")
            .expect("spinner template is valid"),
    );
    bar.set_message(name.to_string());
    bar
}

/// Renders one bar per transfer. Downloads are sequential, so at most one
/// bar is live at a time.
#[derive(Default)]
pub struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    /// Creates an idle progress renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn take(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|mut bar| bar.take())
    }
}

impl DownloadProgress for CliProgress {
    fn on_file_start(&self, name: &str, size: Option<u64>) {
        let bar = size.map_or_else(|| make_spinner(name), |size| make_progress_bar(size, name));
        bar.enable_steady_tick(Duration::from_millis(250));
        if let Ok(mut slot) = self.bar.lock()
            && let Some(stale) = slot.replace(bar)
        {
            stale.finish_and_clear();
        }
    }

    fn on_progress(&self, _name: &str, bytes_delta: u64, _speed: u64) {
        if let Ok(slot) = self.bar.lock()
            && let Some(bar) = slot.as_ref()
        {
            bar.inc(bytes_delta);
        }
    }

    fn on_file_complete(&self, name: &str, stats: &FileStats) {
        if let Some(bar) = self.take() {
            bar.finish_and_clear();
        }
        println!(
            "  {} - {} in {} ({}/s avg)",
            name,
            format_bytes(stats.bytes),
            format_duration(stats.elapsed),
            format_bytes(stats.average_speed),
        );
    }

    fn on_error(&self, name: &str, error: &str) {
        if let Some(bar) = self.take() {
            bar.abandon_with_message(format!("{name}: {error}"));
        }
    }
}

fn print_totals(stats: &SessionStats) {
    if stats.files_downloaded == 0 {
        return;
    }
    println!("  Videos downloaded: {}", stats.files_downloaded);
    println!("  Total size:        {}", format_bytes(stats.total_bytes));
    println!("  Total time:        {}", format_duration(stats.elapsed));
    println!(
        "  Average speed:     {}/s",
        format_bytes(stats.average_speed())
    );
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{title}");
    for item in items {
        println!("- {item}");
    }
}

/// Prints the outcome of one manifest.
pub fn print_batch_report(report: &BatchReport) {
    println!("\n{SEPARATOR}");
    println!("{}", style(&report.manifest).bold());
    println!("{SEPARATOR}");
    println!("  Downloaded now:    {}", report.downloaded.len());
    println!("  Already done:      {}", report.already_done);
    if report.non_video > 0 {
        println!("  Non-video items:   {}", report.non_video);
    }
    print_totals(&report.stats);
    print_list(
        &style("Failed to download:").red().to_string(),
        &report.failed,
    );
    print_list(
        &style("Downloaded, but progress not saved (may be fetched again):")
            .yellow()
            .to_string(),
        &report.unsaved,
    );
}

/// Prints the outcome of a whole-directory batch run.
pub fn print_directory_report(report: &DirectoryReport) {
    if report.manifests.is_empty() && report.failed_files.is_empty() {
        println!("No manifests found.");
        return;
    }
    for batch in &report.manifests {
        print_batch_report(batch);
    }

    println!("\n{SEPARATOR}");
    println!("Batch Summary");
    println!("{SEPARATOR}");
    println!("  Manifests:         {}", report.manifests.len());
    print_totals(&report.stats());

    if report.is_success() {
        println!("\n{}", style("All manifests processed successfully!").green());
    } else {
        let failed: Vec<String> = report
            .failed_files
            .iter()
            .map(|f| format!("{}: {}", f.path.display(), f.reason))
            .collect();
        print_list(&style("Failed files:").red().to_string(), &failed);
    }
}

/// Prints the outcome of a direct-id run.
pub fn print_direct_summary(stats: &SessionStats, failed: &[String]) {
    println!("\n{SEPARATOR}");
    println!("Download Summary");
    println!("{SEPARATOR}");
    print_totals(stats);
    print_list(&style("Failed ids:").red().to_string(), failed);
}

/// Prints the verification counts and the itemized missing list.
pub fn print_verify_report(report: &VerifyReport) {
    println!("\nDownload Status:");
    println!("Total videos: {}", report.total);
    println!("Downloaded: {}", report.present);
    println!("Missing: {}", report.missing.len());

    let inconsistent = report.marked_but_missing().count();
    if inconsistent > 0 {
        println!(
            "{}",
            style(format!(
                "{inconsistent} video(s) marked as downloaded but missing on disk"
            ))
            .yellow()
        );
    }

    for path in &report.unreadable {
        println!("Skipped unreadable manifest: {}", path.display());
    }

    if report.is_complete() {
        println!("\n{}", style("All files are downloaded successfully!").green());
        return;
    }

    println!("\nMissing files:");
    for missing in &report.missing {
        match missing.kind {
            MissingKind::MarkedButMissing => println!("- {}", style(missing).yellow()),
            MissingKind::NotDownloaded => println!("- {missing}"),
        }
    }
}
