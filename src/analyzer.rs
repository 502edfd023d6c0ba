// src/analyzer.rs

use crate::checkout::{GitCheckout, Workspace};
use crate::config::SearchConfig;
use crate::error::{MatchError, Result};
use crate::history::{GitHistory, HistoryProvider};
use crate::metrics_cache::CommitMetricsCache;
use crate::report::Report;
use crate::search::find_upstream_commit;
use tracing::info;

/// Find the upstream commit closest to the configured snapshot
pub fn analyze(config: &SearchConfig) -> Result<Report> {
    config.validate()?;
    info!("Matching {} against {}", config.snapshot.display(), config.upstream);

    // 1. Collect the commit list within the time bounds
    let history = GitHistory::open(&config.upstream)?;
    let commits = history.commits(&config.bounds)?.collect::<Result<Vec<_>>>()?;
    info!("{} commits parsed.", commits.len());
    if commits.is_empty() {
        return Err(MatchError::input(format!(
            "no commits in {} within the requested dates",
            config.upstream
        )));
    }

    // 2. Search, checking commits out into a workspace of our own
    let workspace = match &config.workdir {
        Some(dir) => Workspace::at(dir)?,
        None => Workspace::temporary()?,
    };
    let checkout = GitCheckout::open(history.git_dir())?;
    let mut cache = CommitMetricsCache::new(
        commits,
        &config.snapshot,
        config.compare.clone(),
        workspace,
        checkout,
    )?;

    let best = find_upstream_commit(&mut cache, config.step, config.window)?;
    info!("Best match: sequence {}, commit {}", best.sequence, best.id);

    Report::new(cache.samples())
}
