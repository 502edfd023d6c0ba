// src/checkout.rs

use crate::error::{IoContext, MatchError, Result};
use git2::{ObjectType, Oid, Repository, Tree};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const MODE_EXECUTABLE: i32 = 0o100755;
const MODE_SYMLINK: i32 = 0o120000;

/// Materializes the content of a commit into a directory
pub trait CheckoutOperation {
    /// Write the tree of `commit` into `workdir`, which is empty on entry
    fn checkout(&mut self, workdir: &Path, commit: &str) -> Result<()>;
}

/// Checkout straight from the object database, leaving the repository's own
/// working tree, index and HEAD untouched
pub struct GitCheckout {
    repo: Repository,
}

impl GitCheckout {
    pub fn open(git_dir: &Path) -> Result<Self> {
        Ok(GitCheckout {
            repo: Repository::open(git_dir)?,
        })
    }
}

impl CheckoutOperation for GitCheckout {
    fn checkout(&mut self, workdir: &Path, commit: &str) -> Result<()> {
        let oid = Oid::from_str(commit)?;
        let tree = self.repo.find_commit(oid)?.tree()?;
        write_tree(&self.repo, &tree, workdir)
    }
}

fn write_tree(repo: &Repository, tree: &Tree, dir: &Path) -> Result<()> {
    for entry in tree.iter() {
        let path = dir.join(entry_name(entry.name_bytes()));

        match entry.kind() {
            Some(ObjectType::Tree) => {
                std::fs::create_dir(&path).at_path(&path)?;
                let subtree = repo.find_tree(entry.id())?;
                write_tree(repo, &subtree, &path)?;
            }
            Some(ObjectType::Blob) => {
                let blob = repo.find_blob(entry.id())?;
                write_blob(&path, blob.content(), entry.filemode())?;
            }
            // submodules check out as empty directories
            Some(ObjectType::Commit) => std::fs::create_dir(&path).at_path(&path)?,
            _ => debug!("Skipping tree entry {}", path.display()),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn entry_name(name: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(name))
}

#[cfg(not(unix))]
fn entry_name(name: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(name).into_owned())
}

#[cfg(unix)]
fn write_blob(path: &Path, content: &[u8], mode: i32) -> Result<()> {
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::fs::PermissionsExt;

    if mode == MODE_SYMLINK {
        let target = Path::new(std::ffi::OsStr::from_bytes(content));
        return std::os::unix::fs::symlink(target, path).at_path(path);
    }

    std::fs::write(path, content).at_path(path)?;
    if mode == MODE_EXECUTABLE {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).at_path(path)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn write_blob(path: &Path, content: &[u8], _mode: i32) -> Result<()> {
    std::fs::write(path, content).at_path(path)
}

/// The directory commits are checked out into.
///
/// Tracks which commit it currently holds; it is emptied before every
/// checkout, so nothing from an earlier commit survives.
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
    current: Option<String>,
    _temp: Option<TempDir>,
}

impl Workspace {
    /// A fresh temporary directory, removed when the workspace is dropped
    pub fn temporary() -> Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix("upstream-match-")
            .tempdir()
            .map_err(|e| MatchError::io(std::env::temp_dir(), e))?;
        Ok(Workspace {
            dir: temp.path().to_path_buf(),
            current: None,
            _temp: Some(temp),
        })
    }

    /// Use `dir`, creating it if needed; an existing directory must be empty
    pub fn at(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).at_path(dir)?;
        if std::fs::read_dir(dir).at_path(dir)?.next().is_some() {
            return Err(MatchError::input(format!(
                "checkout directory {} is not empty",
                dir.display()
            )));
        }
        Ok(Workspace {
            dir: dir.to_path_buf(),
            current: None,
            _temp: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Commit currently checked out, if the last checkout succeeded
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn holds(&self, commit: &str) -> bool {
        self.current() == Some(commit)
    }

    /// Replace the workspace content with the tree of `commit`
    pub fn materialize(&mut self, checkout: &mut dyn CheckoutOperation, commit: &str) -> Result<()> {
        if self.holds(commit) {
            return Ok(());
        }

        self.current = None;
        self.clear()?;
        checkout.checkout(&self.dir, commit)?;
        self.current = Some(commit.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.dir).at_path(&self.dir)? {
            let path = entry.at_path(&self.dir)?.path();
            let meta = std::fs::symlink_metadata(&path).at_path(&path)?;
            if meta.is_dir() {
                std::fs::remove_dir_all(&path).at_path(&path)?;
            } else {
                std::fs::remove_file(&path).at_path(&path)?;
            }
        }
        Ok(())
    }
}
