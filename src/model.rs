// src/model.rs

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Position of a commit in the history provider's traversal order
pub type Sequence = usize;

/// One commit of the upstream history, as yielded by the history provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub sequence: Sequence,
    /// Full commit hash
    pub id: String,
    pub time: DateTime<FixedOffset>,
}

impl CommitRecord {
    /// Commit date as shown in reports
    pub fn date(&self) -> String {
        self.time.to_rfc3339()
    }
}

/// Divergence between two directory trees.
///
/// The totals are always computed from the counters, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffMetrics {
    /// Entries present only in the left tree
    pub left_files: u64,
    /// Entries present only in the right tree
    pub right_files: u64,
    /// Files present in both trees whose contents differ
    pub diff_files: u64,
    pub left_lines: u64,
    pub right_lines: u64,
    pub added_lines: u64,
    pub removed_lines: u64,
}

impl DiffMetrics {
    pub fn total_files(&self) -> u64 {
        self.left_files + self.right_files + self.diff_files
    }

    /// The divergence metric minimized by the search
    pub fn total_lines(&self) -> u64 {
        self.left_lines + self.right_lines + self.added_lines + self.removed_lines
    }

    pub fn is_identical(&self) -> bool {
        *self == DiffMetrics::default()
    }
}

impl AddAssign for DiffMetrics {
    fn add_assign(&mut self, other: Self) {
        self.left_files += other.left_files;
        self.right_files += other.right_files;
        self.diff_files += other.diff_files;
        self.left_lines += other.left_lines;
        self.right_lines += other.right_lines;
        self.added_lines += other.added_lines;
        self.removed_lines += other.removed_lines;
    }
}

impl Add for DiffMetrics {
    type Output = DiffMetrics;

    fn add(mut self, other: Self) -> Self::Output {
        self += other;
        self
    }
}

impl Sum for DiffMetrics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(DiffMetrics::default(), Add::add)
    }
}

/// Metrics of one sampled commit against the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetrics {
    pub commit: CommitRecord,
    pub metrics: DiffMetrics,
}

impl CommitMetrics {
    pub fn sequence(&self) -> Sequence {
        self.commit.sequence
    }

    pub fn total_lines(&self) -> u64 {
        self.metrics.total_lines()
    }
}

/// The commit closest to the snapshot among all sampled commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestMatch {
    pub sequence: Sequence,
    pub id: String,
    pub date: String,
    pub total_lines: u64,
}

impl From<&CommitMetrics> for BestMatch {
    fn from(sample: &CommitMetrics) -> Self {
        BestMatch {
            sequence: sample.sequence(),
            id: sample.commit.id.clone(),
            date: sample.commit.date(),
            total_lines: sample.total_lines(),
        }
    }
}

/// Sampling state of one round of the range search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub left: Sequence,
    pub right: Sequence,
    pub step: usize,
}

impl SearchWindow {
    /// Sequences to sample in this round: every `step` from `left`, plus `right`
    pub fn sequences(&self) -> Vec<Sequence> {
        let mut sequences: Vec<Sequence> = (self.left..self.right).step_by(self.step).collect();
        sequences.push(self.right);
        sequences
    }
}
