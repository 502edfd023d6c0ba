// src/report.rs

use crate::error::{MatchError, Result};
use crate::model::{BestMatch, CommitMetrics, Sequence};
use serde::Serialize;

pub const CSV_HEADER: &str = "commit_sequence,commit_id,date,total_files,total_lines,\
left_files,right_files,diff_files,left_lines,right_lines,added_lines,removed_lines";

/// The sample with the smallest `total_lines`; ties go to the lowest sequence
pub fn best_match<'a>(samples: impl IntoIterator<Item = &'a CommitMetrics>) -> Option<BestMatch> {
    samples
        .into_iter()
        .min_by_key(|sample| (sample.total_lines(), sample.sequence()))
        .map(BestMatch::from)
}

/// One row of the sample table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleRow {
    pub commit_sequence: Sequence,
    pub commit_id: String,
    pub date: String,
    pub total_files: u64,
    pub total_lines: u64,
    pub left_files: u64,
    pub right_files: u64,
    pub diff_files: u64,
    pub left_lines: u64,
    pub right_lines: u64,
    pub added_lines: u64,
    pub removed_lines: u64,
}

impl From<&CommitMetrics> for SampleRow {
    fn from(sample: &CommitMetrics) -> Self {
        let m = &sample.metrics;
        SampleRow {
            commit_sequence: sample.sequence(),
            commit_id: sample.commit.id.clone(),
            date: sample.commit.date(),
            total_files: m.total_files(),
            total_lines: m.total_lines(),
            left_files: m.left_files,
            right_files: m.right_files,
            diff_files: m.diff_files,
            left_lines: m.left_lines,
            right_lines: m.right_lines,
            added_lines: m.added_lines,
            removed_lines: m.removed_lines,
        }
    }
}

impl SampleRow {
    fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            self.commit_sequence,
            self.commit_id,
            self.date,
            self.total_files,
            self.total_lines,
            self.left_files,
            self.right_files,
            self.diff_files,
            self.left_lines,
            self.right_lines,
            self.added_lines,
            self.removed_lines
        )
    }
}

/// Outcome of a search run: the best match and every sample, by sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub best: BestMatch,
    pub samples: Vec<SampleRow>,
}

impl Report {
    pub fn new<'a>(samples: impl IntoIterator<Item = &'a CommitMetrics>) -> Result<Self> {
        let mut samples: Vec<&CommitMetrics> = samples.into_iter().collect();
        samples.sort_by_key(|sample| sample.sequence());

        let best = best_match(samples.iter().copied())
            .ok_or_else(|| MatchError::input("no commits were sampled"))?;

        Ok(Report {
            best,
            samples: samples.into_iter().map(SampleRow::from).collect(),
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "Most similar checkout: {} (diff: {}), date: {}, hash: {}.",
            self.best.sequence, self.best.total_lines, self.best.date, self.best.id
        )
    }

    /// Header, one line per sample, then the summary line
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        out.push_str(CSV_HEADER);
        out.push('\n');
        for row in &self.samples {
            out.push_str(&row.to_csv());
            out.push('\n');
        }
        out.push_str(&self.summary());
        out.push('\n');
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
