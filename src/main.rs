//! CLI entry point for the textbook downloader.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use textbook_core::catalog::ShardSet;
use textbook_core::http_client::HttpTimeouts;
use textbook_core::{ArtifactPolicy, RetrievalConfig, RetrievalOrchestrator, write_catalog_csv};
use tracing::{debug, info, warn};

mod app_config;
mod cli;
mod exit_handler;
mod failure;
mod output;

use app_config::FileConfig;
use cli::{Args, Command};

/// Default export file name inside the output directory.
const EXPORT_FILE_NAME: &str = "textbook_info.csv";

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every attempted book was stored.
    Success,
    /// Some books were stored, some failed, or the run was interrupted.
    Partial,
    /// Nothing was stored and at least one book failed.
    Failure,
    /// Bad input, bad config or an unreachable catalog; nothing was attempted.
    Fatal,
}

impl ProcessExit {
    #[must_use]
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial | Self::Failure => 1,
            Self::Fatal => 2,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let exit = match run(args).await {
        Ok(exit) => exit,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Fatal
        }
    };
    ExitCode::from(exit.code())
}

async fn run(args: Args) -> Result<ProcessExit> {
    let file_config = app_config::load_file_config(args.config.as_deref())?;
    init_tracing(&args, &file_config);
    debug!(?args, ?file_config, "CLI arguments and config parsed");

    let config = build_retrieval_config(&args, &file_config);
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| file_config.output_dir.clone())
        .unwrap_or_else(default_output_dir);

    let interrupt = Arc::new(AtomicBool::new(false));
    spawn_interrupt_watcher(Arc::clone(&interrupt));

    let orchestrator = RetrievalOrchestrator::from_config(&config)
        .context("Failed to build HTTP clients")?
        .with_interrupt_flag(interrupt);

    if let Command::Export { output } = &args.command {
        let path = output
            .clone()
            .unwrap_or_else(|| output_dir.join(EXPORT_FILE_NAME));
        return export_catalog(&orchestrator, &path).await;
    }
    let Some(locator) = args.command.locator() else {
        return Ok(ProcessExit::Success);
    };

    tokio::fs::create_dir_all(&output_dir).await.with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            output_dir.display()
        )
    })?;
    info!(%locator, output_dir = %output_dir.display(), "Textbook downloader starting");

    let report = orchestrator.run(&locator, &output_dir).await?;
    output::print_report(&report);
    Ok(exit_handler::exit_outcome_for_report(&report))
}

fn init_tracing(args: &Args, file_config: &FileConfig) {
    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => file_config
                .verbosity
                .map_or("info", app_config::VerbositySetting::log_level),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Layers config-file values and then CLI flags over the library defaults.
fn build_retrieval_config(args: &Args, file: &FileConfig) -> RetrievalConfig {
    let mut config = RetrievalConfig::default();

    if let Some(url) = &file.catalog_version_url {
        config.catalog_version_url.clone_from(url);
    }
    if let Some(url) = &file.detail_base_url {
        config.detail_base_url.clone_from(url);
    }

    let defaults = config.timeouts;
    config.timeouts = HttpTimeouts {
        connect: file
            .connect_timeout_secs
            .map_or(defaults.connect, Duration::from_secs),
        request: args
            .timeout_secs
            .or(file.request_timeout_secs)
            .map_or(defaults.request, Duration::from_secs),
    };

    if let Some(min_bytes) = args.min_bytes.or(file.min_artifact_bytes) {
        config.artifact_policy = ArtifactPolicy::with_min_bytes(min_bytes);
    }
    if let Some(pause_ms) = args.pause_ms.or(file.pause_ms) {
        config.pause = Duration::from_millis(pause_ms);
    }
    if let Some(attempts) = file.catalog_retries {
        config.catalog_attempts = attempts;
    }
    config.allow_fallback_catalog =
        args.allow_fallback_catalog || file.allow_fallback_catalog.unwrap_or(false);
    if let Some(shards) = &file.fallback_shards {
        config.fallback_shards.clone_from(shards);
    }
    config
}

/// `~/Downloads/textbook_download`, or `./textbook_download` without a home directory.
fn default_output_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map_or_else(
            || PathBuf::from("textbook_download"),
            |home| PathBuf::from(home).join("Downloads").join("textbook_download"),
        )
}

fn spawn_interrupt_watcher(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; finishing the current book before stopping");
            flag.store(true, Ordering::SeqCst);
        }
    });
}

async fn export_catalog(orchestrator: &RetrievalOrchestrator, path: &Path) -> Result<ProcessExit> {
    let listing = orchestrator.fetch_shard_listing().await?;
    if listing.is_degraded() {
        println!("⚠️ Live catalog unreachable; exporting from the configured fallback shard list");
    }

    let mut shards = ShardSet::new(orchestrator.shard_source(), listing);
    let mut csv = Vec::new();
    let summary = write_catalog_csv(&mut shards, &mut csv).await?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }
    tokio::fs::write(path, csv)
        .await
        .with_context(|| format!("Failed to write export file '{}'", path.display()))?;

    for line in output::export_summary_lines(&summary, path) {
        println!("{line}");
    }

    Ok(if summary.skipped_shards.is_empty() && summary.malformed_numbers.is_empty() {
        ProcessExit::Success
    } else {
        ProcessExit::Partial
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_flags_override_file_config() {
        let file = FileConfig {
            pause_ms: Some(500),
            min_artifact_bytes: Some(2_000_000),
            request_timeout_secs: Some(60),
            connect_timeout_secs: Some(3),
            ..FileConfig::default()
        };
        let config = build_retrieval_config(
            &args(&["textbook-downloader", "seq", "1", "--pause-ms", "0", "--timeout-secs", "5"]),
            &file,
        );
        assert_eq!(config.pause, Duration::ZERO);
        assert_eq!(config.timeouts.request, Duration::from_secs(5));
        assert_eq!(config.timeouts.connect, Duration::from_secs(3));
        assert_eq!(config.artifact_policy.min_bytes, 2_000_000);
    }

    #[test]
    fn test_defaults_without_file_or_flags() {
        let config = build_retrieval_config(
            &args(&["textbook-downloader", "seq", "1"]),
            &FileConfig::default(),
        );
        assert_eq!(config.pause, Duration::from_secs(1));
        assert_eq!(config.artifact_policy.min_bytes, 1_000_000);
        assert!(!config.allow_fallback_catalog);
    }

    #[test]
    fn test_fallback_enabled_by_flag_uses_file_shards() {
        let file = FileConfig {
            fallback_shards: Some(vec!["https://mirror.example/part_1.json".into()]),
            ..FileConfig::default()
        };
        let config = build_retrieval_config(
            &args(&["textbook-downloader", "export", "--allow-fallback-catalog"]),
            &file,
        );
        assert!(config.allow_fallback_catalog);
        assert_eq!(config.fallback_shards.len(), 1);
    }

    #[test]
    fn test_process_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Failure.code(), 1);
        assert_eq!(ProcessExit::Fatal.code(), 2);
    }
}
