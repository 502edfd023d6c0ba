// src/history.rs

use crate::config::TimeBounds;
use crate::error::{MatchError, Result};
use crate::model::CommitRecord;
use chrono::{DateTime, FixedOffset, TimeZone};
use git2::{Repository, Sort};
use std::path::Path;
use tempfile::TempDir;
use tracing::info;

/// Source of the ordered commit list of an upstream history
pub trait HistoryProvider {
    /// Commits within `bounds`, in traversal order, numbered from 0
    fn commits<'a>(
        &'a self,
        bounds: &'a TimeBounds,
    ) -> Result<Box<dyn Iterator<Item = Result<CommitRecord>> + 'a>>;
}

/// History of a git repository, walked oldest first from HEAD
pub struct GitHistory {
    repo: Repository,
    // Keeps a cloned remote alive for the lifetime of the history
    _clone_dir: Option<TempDir>,
}

impl GitHistory {
    /// Open a local repository, or clone `location` when it is a URL
    pub fn open(location: &str) -> Result<Self> {
        if location.contains("://") {
            let clone_dir = tempfile::tempdir()
                .map_err(|e| MatchError::io(std::env::temp_dir(), e))?;
            info!("Cloning {} into {}", location, clone_dir.path().display());
            let repo = git2::build::RepoBuilder::new()
                .bare(true)
                .clone(location, clone_dir.path())
                .map_err(|e| MatchError::input(format!("cannot clone upstream {}: {}", location, e)))?;
            return Ok(GitHistory {
                repo,
                _clone_dir: Some(clone_dir),
            });
        }

        let repo = Repository::open(Path::new(location)).map_err(|e| {
            MatchError::input(format!("cannot open upstream repository {}: {}", location, e))
        })?;
        Ok(GitHistory {
            repo,
            _clone_dir: None,
        })
    }

    /// The repository's git directory, for opening further handles on it
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }
}

impl HistoryProvider for GitHistory {
    fn commits<'a>(
        &'a self,
        bounds: &'a TimeBounds,
    ) -> Result<Box<dyn Iterator<Item = Result<CommitRecord>> + 'a>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;

        let records = revwalk
            .map(move |oid| -> Result<(String, DateTime<FixedOffset>)> {
                let commit = self.repo.find_commit(oid?)?;
                Ok((commit.id().to_string(), commit_time(&commit.time())?))
            })
            .filter(move |entry| match entry {
                Ok((_, time)) => bounds.contains(time),
                Err(_) => true,
            })
            .enumerate()
            .map(|(sequence, entry)| entry.map(|(id, time)| CommitRecord { sequence, id, time }));

        Ok(Box::new(records))
    }
}

fn commit_time(time: &git2::Time) -> Result<DateTime<FixedOffset>> {
    FixedOffset::east_opt(time.offset_minutes() * 60)
        .and_then(|offset| offset.timestamp_opt(time.seconds(), 0).single())
        .ok_or_else(|| MatchError::input(format!("invalid commit time {}", time.seconds())))
}
