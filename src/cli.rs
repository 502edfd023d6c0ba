// src/cli.rs

use crate::config::{CompareOptions, SearchConfig, TimeBounds, UniqueDepth, DEFAULT_IGNORE, DEFAULT_WINDOW};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Find the upstream commit closest to a modified snapshot of its source tree
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Upstream git repository: a local path or a URL to clone
    #[arg(short, long)]
    pub repo: String,

    /// Snapshot directory to match (e.g. an extracted source package)
    #[arg(short, long)]
    pub pkg: PathBuf,

    /// Consider only commits on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub after: Option<String>,

    /// Consider only commits on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub before: Option<String>,

    /// Initial sampling stride: compare every `step` commits, then refine
    #[arg(long, default_value_t = 1)]
    pub step: usize,

    /// Number of lowest samples that bound the next round
    #[arg(long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Walk directories present on one side only, counting each file in them
    #[arg(long)]
    pub deep_unique: bool,

    /// Names to skip at every level (replaces the default list)
    #[arg(long = "ignore", value_name = "NAME")]
    pub ignore: Vec<String>,

    /// Directory to check commits out into (must be empty; default: a temporary one)
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Output format of the report
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    pub format: Format,

    /// Logging level for output
    #[arg(short, long, value_enum)]
    pub logging: Option<LogLevel>,

    /// Write log output to this file instead of stderr
    #[arg(long)]
    pub logfile: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum Format {
    /// One comma-separated row per sampled commit, then a summary line
    Csv,
    /// The best match and all samples as a JSON document
    Json,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Debug,
}

impl Args {
    pub fn to_config(&self) -> Result<SearchConfig> {
        let ignore = if self.ignore.is_empty() {
            DEFAULT_IGNORE.iter().map(|name| name.to_string()).collect()
        } else {
            self.ignore.clone()
        };

        let mut config = SearchConfig::new(self.repo.clone(), self.pkg.clone());
        config.workdir = self.workdir.clone();
        config.bounds = TimeBounds::from_dates(self.after.as_deref(), self.before.as_deref())?;
        config.step = self.step;
        config.window = self.window;
        config.compare = CompareOptions {
            unique_depth: if self.deep_unique {
                UniqueDepth::Deep
            } else {
                UniqueDepth::Shallow
            },
            ignore,
        };
        Ok(config)
    }
}
