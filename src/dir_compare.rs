// src/dir_compare.rs

use crate::config::{CompareOptions, UniqueDepth};
use crate::error::{IoContext, MatchError, Result};
use crate::line_diff::{compare_files, count_lines, LineDiff};
use crate::model::DiffMetrics;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Shallow comparison of one directory level of two trees.
///
/// Names are classified the way a single-level directory listing sees them:
/// present on one side only, regular files on both sides, directories on both
/// sides, or "funny" (kinds differ, or one side cannot be stat'ed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirComparison {
    left: PathBuf,
    right: PathBuf,
    left_only: Vec<OsString>,
    right_only: Vec<OsString>,
    common_files: Vec<OsString>,
    common_dirs: Vec<OsString>,
    common_funny: Vec<OsString>,
}

impl DirComparison {
    pub fn new(left: &Path, right: &Path, options: &CompareOptions) -> Result<Self> {
        let left_names = list_dir(left, options)?;
        let right_names = list_dir(right, options)?;

        let mut comparison = DirComparison {
            left: left.to_path_buf(),
            right: right.to_path_buf(),
            left_only: left_names.difference(&right_names).cloned().collect(),
            right_only: right_names.difference(&left_names).cloned().collect(),
            common_files: Vec::new(),
            common_dirs: Vec::new(),
            common_funny: Vec::new(),
        };

        for name in left_names.intersection(&right_names) {
            let left_meta = std::fs::metadata(left.join(name));
            let right_meta = std::fs::metadata(right.join(name));

            match (left_meta, right_meta) {
                (Ok(l), Ok(r)) if l.is_dir() && r.is_dir() => comparison.common_dirs.push(name.clone()),
                (Ok(l), Ok(r)) if l.is_file() && r.is_file() => comparison.common_files.push(name.clone()),
                _ => comparison.common_funny.push(name.clone()),
            }
        }

        Ok(comparison)
    }

    pub fn left(&self) -> &Path {
        &self.left
    }

    pub fn right(&self) -> &Path {
        &self.right
    }

    pub fn left_only(&self) -> &[OsString] {
        &self.left_only
    }

    pub fn right_only(&self) -> &[OsString] {
        &self.right_only
    }

    pub fn common_files(&self) -> &[OsString] {
        &self.common_files
    }

    pub fn common_dirs(&self) -> &[OsString] {
        &self.common_dirs
    }

    pub fn common_funny(&self) -> &[OsString] {
        &self.common_funny
    }

    /// Comparisons of the subdirectories present on both sides
    pub fn subdirs(&self, options: &CompareOptions) -> Result<Vec<DirComparison>> {
        self.common_dirs()
            .iter()
            .map(|name| DirComparison::new(&self.left.join(name), &self.right.join(name), options))
            .collect()
    }
}

/// Names in a directory, sorted, without the ignored ones
fn list_dir(dir: &Path, options: &CompareOptions) -> Result<BTreeSet<OsString>> {
    let entries = std::fs::read_dir(dir).at_path(dir)?;

    let mut names = BTreeSet::new();
    for entry in entries {
        let name = entry.at_path(dir)?.file_name();
        if !options.is_ignored(&name.to_string_lossy()) {
            names.insert(name);
        }
    }
    Ok(names)
}

/// Divergence between two directory trees, aggregated over common subdirectories
pub fn compare_trees(left: &Path, right: &Path, options: &CompareOptions) -> Result<DiffMetrics> {
    for dir in [left, right] {
        if !dir.is_dir() {
            return Err(MatchError::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }
    }

    compare_dirs(&DirComparison::new(left, right, options)?, options)
}

/// Post-order aggregation of the metrics of `comparison` and everything below it
pub fn compare_dirs(comparison: &DirComparison, options: &CompareOptions) -> Result<DiffMetrics> {
    let (left_files, left_lines) = count_unique(comparison.left(), comparison.left_only(), options)?;
    let (right_files, right_lines) = count_unique(comparison.right(), comparison.right_only(), options)?;
    let (diff_files, common) = count_common(comparison)?;

    for name in comparison.common_funny() {
        warn!(
            "Skipping {:?}: not the same kind of entry in {} and {}",
            name,
            comparison.left().display(),
            comparison.right().display()
        );
    }

    let mut metrics = DiffMetrics {
        left_files,
        right_files,
        diff_files,
        left_lines,
        right_lines,
        added_lines: common.added,
        removed_lines: common.removed,
    };

    metrics += comparison
        .subdirs(options)?
        .iter()
        .map(|subdir| compare_dirs(subdir, options))
        .sum::<Result<DiffMetrics>>()?;

    Ok(metrics)
}

/// Number of entries present on one side only, and their lines
fn count_unique(dir: &Path, names: &[OsString], options: &CompareOptions) -> Result<(u64, u64)> {
    let mut files = 0;
    let mut lines = 0;

    for name in names {
        let path = dir.join(name);
        match options.unique_depth {
            UniqueDepth::Shallow => {
                files += 1;
                if path.is_file() {
                    lines += count_lines(&path)?;
                }
            }
            UniqueDepth::Deep if path.is_dir() => {
                let (walked_files, walked_lines) = walk_unique(&path, options)?;
                files += walked_files;
                lines += walked_lines;
            }
            UniqueDepth::Deep => {
                files += 1;
                if path.is_file() {
                    lines += count_lines(&path)?;
                }
            }
        }
    }

    debug!(
        "Unique files in dir {}: files: {}, lines: {}",
        dir.display(),
        files,
        lines
    );
    Ok((files, lines))
}

fn walk_unique(dir: &Path, options: &CompareOptions) -> Result<(u64, u64)> {
    let mut files = 0;
    let mut lines = 0;

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !options.is_ignored(&entry.file_name().to_string_lossy()));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
            MatchError::io(path, source)
        })?;

        if entry.file_type().is_file() {
            files += 1;
            lines += count_lines(entry.path())?;
        }
    }

    Ok((files, lines))
}

/// Number of differing common files, and their summed line changes
fn count_common(comparison: &DirComparison) -> Result<(u64, LineDiff)> {
    let diffs = comparison
        .common_files()
        .par_iter()
        .map(|name| compare_files(&comparison.left().join(name), &comparison.right().join(name)))
        .collect::<Result<Vec<_>>>()?;

    let diff_files = diffs.iter().filter(|diff| diff.is_different()).count() as u64;
    let total = diffs.iter().fold(LineDiff::default(), |acc, diff| LineDiff {
        added: acc.added + diff.added,
        removed: acc.removed + diff.removed,
    });

    Ok((diff_files, total))
}
