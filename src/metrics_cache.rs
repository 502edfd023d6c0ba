// src/metrics_cache.rs

use crate::checkout::{CheckoutOperation, Workspace};
use crate::config::CompareOptions;
use crate::dir_compare::compare_trees;
use crate::error::{MatchError, Result};
use crate::model::{CommitMetrics, CommitRecord, SearchWindow, Sequence};
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Metrics of sampled commits against the snapshot, computed at most once per
/// commit for the lifetime of a search run.
///
/// Owns the checkout workspace: samples are computed one at a time, since each
/// one overwrites it.
pub struct CommitMetricsCache<C> {
    commits: Vec<CommitRecord>,
    snapshot: PathBuf,
    options: CompareOptions,
    workspace: Workspace,
    checkout: C,
    metrics: BTreeMap<Sequence, CommitMetrics>,
}

impl<C: CheckoutOperation> CommitMetricsCache<C> {
    pub fn new(
        commits: Vec<CommitRecord>,
        snapshot: impl Into<PathBuf>,
        options: CompareOptions,
        workspace: Workspace,
        checkout: C,
    ) -> Result<Self> {
        if commits.is_empty() {
            return Err(MatchError::input("no commits to match against"));
        }

        Ok(CommitMetricsCache {
            commits,
            snapshot: snapshot.into(),
            options,
            workspace,
            checkout,
            metrics: BTreeMap::new(),
        })
    }

    /// Number of commits in the history
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn commit(&self, sequence: Sequence) -> Result<&CommitRecord> {
        self.commits.get(sequence).ok_or_else(|| {
            MatchError::input(format!(
                "sequence {} out of range: history has {} commits",
                sequence,
                self.commits.len()
            ))
        })
    }

    /// Metrics for `sequence`, checking the commit out and comparing it on a miss
    pub fn get_or_compute(&mut self, sequence: Sequence) -> Result<&CommitMetrics> {
        if !self.metrics.contains_key(&sequence) {
            let sample = self.compute(sequence)?;
            self.metrics.insert(sequence, sample);
        }
        Ok(&self.metrics[&sequence])
    }

    fn compute(&mut self, sequence: Sequence) -> Result<CommitMetrics> {
        let commit = self.commit(sequence)?.clone();

        self.workspace
            .materialize(&mut self.checkout, &commit.id)
            .map_err(|e| MatchError::Checkout {
                sequence,
                commit: commit.id.clone(),
                source: Box::new(e),
            })?;

        let metrics = if self.workspace.holds(&commit.id) {
            compare_trees(self.workspace.path(), &self.snapshot, &self.options)
        } else {
            Err(MatchError::input("workspace does not hold the requested commit"))
        }
        .map_err(|e| MatchError::Compare {
            sequence,
            commit: commit.id.clone(),
            source: Box::new(e),
        })?;

        debug!(
            "Commit {}. Files: {}, {}, {}, lines: {}, {}, {}, {}",
            commit.id,
            metrics.left_files,
            metrics.right_files,
            metrics.diff_files,
            metrics.left_lines,
            metrics.right_lines,
            metrics.added_lines,
            metrics.removed_lines
        );
        if metrics.is_identical() {
            info!("Commit {} matches the snapshot exactly.", commit.id);
        }

        Ok(CommitMetrics { commit, metrics })
    }

    /// Compute every sequence the window samples
    pub fn compute_range(&mut self, window: &SearchWindow) -> Result<()> {
        let pending: Vec<Sequence> = window
            .sequences()
            .into_iter()
            .filter(|sequence| !self.metrics.contains_key(sequence))
            .collect();

        let bar = ProgressBar::new(pending.len() as u64);
        bar.set_message(format!("Sampling every {} commits", window.step));

        for sequence in pending {
            info!("Computing metrics for {}.", sequence);
            let sample = self.get_or_compute(sequence)?;
            info!(
                "Sequence {}: total_files {}, total_lines {}",
                sequence,
                sample.metrics.total_files(),
                sample.total_lines()
            );
            bar.inc(1);
        }
        bar.finish_and_clear();

        Ok(())
    }

    /// Sampled sequences, ascending
    pub fn sampled(&self) -> Vec<Sequence> {
        self.metrics.keys().copied().collect()
    }

    /// Every sample so far, sorted by sequence
    pub fn samples(&self) -> impl Iterator<Item = &CommitMetrics> {
        self.metrics.values()
    }
}
