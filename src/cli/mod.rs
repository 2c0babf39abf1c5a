//! Command-line interface: argument parsing, mode dispatch and exit codes.

mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use env_logger::Env;

use crate::config::AppConfig;
use crate::download::Downloader;
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::stats::SessionStats;
use crate::verify::verify_manifests;

pub use progress::CliProgress;
use progress::{print_direct_summary, print_directory_report, print_verify_report};

/// Downloads videos by id or from course manifests, and audits the results.
#[derive(Parser, Debug)]
#[command(name = "wisty", version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["id", "jsons", "verify"])))]
pub struct Cli {
    /// Comma-separated video ids to download
    #[arg(short, long, value_delimiter = ',')]
    pub id: Vec<String>,

    /// Resolution for --id downloads
    #[arg(short, long, default_value = "1080p")]
    pub resolution: String,

    /// Output file name prefix for --id downloads
    #[arg(short, long, default_value_t)]
    pub name: String,

    /// Process every manifest in the manifest directory
    #[arg(long)]
    pub jsons: bool,

    /// Check downloaded files against the manifests
    #[arg(long)]
    pub verify: bool,

    /// Config file (default: <config dir>/wisty/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Network timeout in seconds for catalog requests and stalled reads
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Directory holding course manifests
    #[arg(long, value_name = "DIR")]
    pub manifest_dir: Option<PathBuf>,

    /// Root directory for downloaded videos
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Applies command-line overrides on top of loaded configuration.
    #[must_use]
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(secs) = self.timeout {
            config = config.with_timeout(secs);
        }
        if let Some(dir) = &self.manifest_dir {
            config.paths.manifest_dir.clone_from(dir);
        }
        if let Some(dir) = &self.output_dir {
            config.paths.output_dir.clone_from(dir);
        }
        config
    }

    /// Ids given with `--id`, without empty entries.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.id
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .collect()
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Parses arguments, runs the selected mode and maps the outcome to an
/// exit code.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e @ Error::Usage(_)) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the mode selected by `cli`. Returns whether everything succeeded.
///
/// # Errors
///
/// Returns an error for configuration problems or when the selected mode
/// cannot start at all.
pub async fn execute(cli: &Cli) -> Result<bool> {
    let config = cli.apply(AppConfig::load(cli.config.as_deref())?);

    if cli.verify {
        let report = verify_manifests(
            &TokioFileSystem,
            &config.layout(),
            &config.paths.manifest_dir,
        )
        .await?;
        print_verify_report(&report);
        return Ok(report.is_complete());
    }

    let downloader = Downloader::from_config(&config)?;
    let progress = CliProgress::new();

    if cli.jsons {
        let report = downloader
            .run_manifest_dir(&config.paths.manifest_dir, &progress)
            .await?;
        print_directory_report(&report);
        return Ok(report.is_success());
    }

    run_direct(cli, &downloader, &progress).await
}

async fn run_direct(cli: &Cli, downloader: &Downloader, progress: &CliProgress) -> Result<bool> {
    let ids = cli.ids();
    if ids.is_empty() {
        return Err(Error::Usage("--id needs at least one video id".into()));
    }
    let resolution = downloader.resolutions().lookup(&cli.resolution)?;
    let output_dir = downloader.layout().output_dir();
    TokioFileSystem.create_dir_all(output_dir).await?;

    let mut stats = SessionStats::new();
    let mut failed = Vec::new();
    for (i, id) in ids.iter().enumerate() {
        let dest = downloader.layout().numbered(&cli.name, i + 1);
        log::info!("Downloading {id} at {resolution} to {}", dest.display());
        match downloader
            .download_video(id, Some(resolution), &dest, id, progress)
            .await
        {
            Ok(fetched) => stats.add_download(&fetched.stats),
            Err(e) => {
                log::warn!("Error downloading {id}: {e}");
                failed.push(format!("{id}: {e}"));
            }
        }
    }

    print_direct_summary(&stats, &failed);
    Ok(failed.is_empty())
}
