// src/testing.rs
//
// Shared fixtures for unit tests: throwaway git repositories and a fake
// checkout whose divergence from an empty snapshot is known in advance.

use crate::checkout::CheckoutOperation;
use crate::error::{IoContext, MatchError, Result};
use crate::model::CommitRecord;
use assert_fs::TempDir;
use chrono::DateTime;
use git2::{IndexAddOption, Repository, Signature, Time};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

pub fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    Repository::init(dir.path()).unwrap();
    dir
}

/// Write `files` into the work tree and commit everything at `when` (RFC 3339)
pub fn commit_files(repo_dir: &Path, files: &[(&str, &str)], when: &str) -> String {
    let repo = Repository::open(repo_dir).unwrap();

    for (name, content) in files {
        let path = repo_dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
    }

    let mut index = repo.index().unwrap();
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None).unwrap();
    index.update_all(["*"].iter(), None).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let time = DateTime::parse_from_rfc3339(when).unwrap();
    let signature = Signature::new(
        "Upstream Dev",
        "dev@example.org",
        &Time::new(time.timestamp(), time.offset().local_minus_utc() / 60),
    )
    .unwrap();

    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, "update", &tree, &parents)
        .unwrap()
        .to_string()
}

pub fn remove_files(repo_dir: &Path, files: &[&str]) {
    for name in files {
        std::fs::remove_file(repo_dir.join(name)).unwrap();
    }
}

/// Commit records `c0`, `c1`, ... one day apart
pub fn records(count: usize) -> Vec<CommitRecord> {
    let start = DateTime::parse_from_rfc3339("2016-01-01T00:00:00+00:00").unwrap();
    (0..count)
        .map(|sequence| CommitRecord {
            sequence,
            id: format!("c{}", sequence),
            time: start + chrono::Duration::days(sequence as i64),
        })
        .collect()
}

/// Checkout of commit `cN` writes one file with `values[N]` lines, so against an
/// empty snapshot the commit's `total_lines` is exactly `values[N]`
pub struct LineCountCheckout {
    values: Vec<u64>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl LineCountCheckout {
    pub fn new(values: Vec<u64>) -> Self {
        LineCountCheckout {
            values,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Commits checked out so far, in order
    pub fn calls(&self) -> Rc<RefCell<Vec<String>>> {
        self.calls.clone()
    }
}

impl CheckoutOperation for LineCountCheckout {
    fn checkout(&mut self, workdir: &Path, commit: &str) -> Result<()> {
        self.calls.borrow_mut().push(commit.to_string());

        let value = commit
            .strip_prefix('c')
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| self.values.get(n))
            .ok_or_else(|| MatchError::input(format!("unknown commit {}", commit)))?;

        let path = workdir.join("upstream.txt");
        std::fs::write(&path, "x\n".repeat(*value as usize)).at_path(&path)
    }
}
