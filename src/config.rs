// src/config.rs

use crate::error::{MatchError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use std::path::PathBuf;

/// Names skipped on both sides at every directory level
pub const DEFAULT_IGNORE: [&str; 8] = [
    "RCS",
    "CVS",
    "tags",
    ".git",
    ".hg",
    ".bzr",
    "_darcs",
    "__pycache__",
];

pub const DEFAULT_WINDOW: usize = 3;

/// How entries present on only one side are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UniqueDepth {
    /// A unique directory counts as a single file with no lines
    #[default]
    Shallow,
    /// A unique directory is walked, and every regular file in it counts with its lines
    Deep,
}

/// Settings of a single tree comparison
#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub unique_depth: UniqueDepth,
    pub ignore: Vec<String>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            unique_depth: UniqueDepth::default(),
            ignore: DEFAULT_IGNORE.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl CompareOptions {
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|ignored| ignored == name)
    }
}

/// Inclusive bounds on commit time for history traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBounds {
    pub after: Option<DateTime<FixedOffset>>,
    pub before: Option<DateTime<FixedOffset>>,
}

impl TimeBounds {
    /// Bounds from `YYYY-MM-DD` dates; `after` starts at midnight UTC, `before` ends at the last second of its day
    pub fn from_dates(after: Option<&str>, before: Option<&str>) -> Result<Self> {
        let after = after
            .map(|date| parse_date(date, NaiveTime::MIN))
            .transpose()?;
        let before = before
            .map(|date| {
                let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)
                    .ok_or_else(|| MatchError::input("invalid end of day"))?;
                parse_date(date, end_of_day)
            })
            .transpose()?;

        if let (Some(after), Some(before)) = (after, before) {
            if after > before {
                return Err(MatchError::input(format!(
                    "--after {} is later than --before {}",
                    after.date_naive(),
                    before.date_naive()
                )));
            }
        }

        Ok(TimeBounds { after, before })
    }

    pub fn contains(&self, time: &DateTime<FixedOffset>) -> bool {
        self.after.map_or(true, |after| *time >= after)
            && self.before.map_or(true, |before| *time <= before)
    }
}

fn parse_date(date: &str, time: NaiveTime) -> Result<DateTime<FixedOffset>> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| MatchError::input(format!("invalid date '{}': {}", date, e)))?;
    Ok(Utc.from_utc_datetime(&day.and_time(time)).fixed_offset())
}

/// Everything a search run needs, passed explicitly to the driver
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Upstream repository: a local path, or a URL to clone
    pub upstream: String,
    /// The snapshot directory being matched
    pub snapshot: PathBuf,
    /// Directory commits are checked out into; a temporary one when absent
    pub workdir: Option<PathBuf>,
    pub bounds: TimeBounds,
    /// Initial sampling stride
    pub step: usize,
    /// Capacity of the minimal-values buffer
    pub window: usize,
    pub compare: CompareOptions,
}

impl SearchConfig {
    pub fn new(upstream: impl Into<String>, snapshot: impl Into<PathBuf>) -> Self {
        SearchConfig {
            upstream: upstream.into(),
            snapshot: snapshot.into(),
            workdir: None,
            bounds: TimeBounds::default(),
            step: 1,
            window: DEFAULT_WINDOW,
            compare: CompareOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.upstream.trim().is_empty() {
            return Err(MatchError::input("upstream location is empty"));
        }
        if !self.snapshot.is_dir() {
            return Err(MatchError::input(format!(
                "snapshot directory {} does not exist or is not a directory",
                self.snapshot.display()
            )));
        }
        if self.step == 0 {
            return Err(MatchError::input("step must be at least 1"));
        }
        if self.window == 0 {
            return Err(MatchError::input("window must hold at least 1 entry"));
        }
        Ok(())
    }
}
