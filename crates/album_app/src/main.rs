mod cli;
mod config;
mod logging;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use album_core::{AlbumRef, RunStatus};
use album_engine::{ensure_output_dir, Pipeline, PipelineReport, ShutdownToken};
use album_logging::{album_error, album_info, album_warn};
use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;

use crate::cli::Cli;
use crate::progress::LogSink;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(status) => ExitCode::from(exit_code(&status)),
        Err(err) => {
            album_error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunStatus> {
    let album = AlbumRef::parse(&cli.album_link)
        .with_context(|| format!("unrecognised album link '{}'", cli.album_link))?;
    let config = config::load(&cli)?;
    let run_dir = cli
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(album.run_dir_name()));

    ensure_output_dir(&run_dir)?;
    logging::initialize(&run_dir, album_logging::default_level(cli.verbose));
    album_info!("album_grabber started at {}", Local::now().to_rfc3339());
    album_info!("Album {} into {}", album, run_dir.display());

    let shutdown = ShutdownToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                album_warn!("Ctrl+C received; finishing in-flight downloads.");
                shutdown.request();
            }
        }
    });

    let pipeline = Pipeline::with_reqwest(config, Arc::new(LogSink::new()), shutdown)?;
    let report = pipeline.run(&album, &run_dir).await?;
    print_status(&report);
    Ok(report.status())
}

fn print_status(report: &PipelineReport) {
    let summary = &report.summary;
    let line = format!(
        "{}: {} URLs ({} new), {} downloaded, {} skipped, {} failed",
        report.status(),
        summary.discovered,
        summary.newly_discovered,
        summary.downloaded,
        summary.skipped,
        summary.failed
    );
    album_info!("{}", line);
    println!("{line}");
    if let Some(path) = &report.ledger_path {
        println!("Unresolved URLs: {}", path.display());
    }
}

fn exit_code(status: &RunStatus) -> u8 {
    match status {
        RunStatus::Completed => 0,
        RunStatus::CompletedWithFailures(_) => 2,
        RunStatus::AbortedDuringDiscovery => 3,
        RunStatus::Interrupted { .. } => 130,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_status() {
        assert_eq!(exit_code(&RunStatus::Completed), 0);
        assert_eq!(exit_code(&RunStatus::CompletedWithFailures(4)), 2);
        assert_eq!(exit_code(&RunStatus::AbortedDuringDiscovery), 3);
        assert_eq!(exit_code(&RunStatus::Interrupted { pending: 1 }), 130);
    }
}
