// src/main.rs

mod analyzer;
mod checkout;
mod cli;
mod config;
mod dir_compare;
mod error;
mod history;
mod line_diff;
mod metrics_cache;
mod model;
mod report;
mod search;
#[cfg(test)]
mod testing;

use anyhow::Context;
use clap::Parser;
use cli::{Args, Format, LogLevel};
use std::time::Instant;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_logging(&args)?;
    let start_time = Instant::now();

    let config = args.to_config().context("Invalid arguments")?;
    let report = analyzer::analyze(&config)
        .with_context(|| format!("Error matching {} against {}", config.snapshot.display(), config.upstream))?;

    match args.format {
        Format::Csv => print!("{}", report.to_csv()),
        Format::Json => println!("{}", report.to_json()?),
    }

    info!(
        "Sampled {} commits in {:.2?}.",
        report.samples.len(),
        start_time.elapsed()
    );
    Ok(())
}

/// Log to stderr, or to a truncated `--logfile`, at the requested level
fn init_logging(args: &Args) -> anyhow::Result<Option<WorkerGuard>> {
    let level = match args.logging {
        Some(LogLevel::Info) => Level::INFO,
        Some(LogLevel::Debug) => Level::DEBUG,
        None => Level::WARN,
    };
    let subscriber = tracing_subscriber::fmt().with_max_level(level).with_target(false);

    match &args.logfile {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Cannot create log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            subscriber.with_writer(writer).with_ansi(false).init();
            Ok(Some(guard))
        }
        None => {
            subscriber.with_writer(std::io::stderr).init();
            Ok(None)
        }
    }
}
