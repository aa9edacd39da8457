//! Enumeration of the files a configuration run may rewrite.

use crate::common::ErrorType;

use cause::{Cause, cause};
use git2::Repository;
use ignore::WalkBuilder;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Files known to version control at run start, minus an exclusion set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedFileSet {
    files: Vec<PathBuf>,
}

impl TrackedFileSet {
    /// Collect the files under `root`.
    ///
    /// Uses the git index when `root` is a repository, otherwise a walk of the
    /// tree that honors `.gitignore`. Paths in `exclude` are either absolute or
    /// relative to `root`.
    pub fn collect(root: &Path, exclude: &[PathBuf]) -> Result<Self, Cause<ErrorType>> {
        let candidates = if root.join(".git").exists() {
            let repo = Repository::open(root).map_err(|e| {
                cause!(ErrorType::FileEnumeration)
                    .msg(format!("Cannot open repository at {}", root.display()))
                    .src(e)
            })?;
            index_paths(&repo, root)?
        } else {
            debug!("{} is not a repository, walking the tree", root.display());
            walk_paths(root)?
        };

        let excluded: BTreeSet<PathBuf> = exclude
            .iter()
            .map(|p| normalize(&root.join(p)))
            .collect();

        let files = candidates
            .into_iter()
            .filter(|p| {
                let keep = !excluded.contains(&normalize(p));
                if !keep {
                    debug!("Excluding {}", p.display());
                }
                keep
            })
            .collect();

        Ok(Self { files })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|p| p == path)
    }
}

fn index_paths(repo: &Repository, root: &Path) -> Result<BTreeSet<PathBuf>, Cause<ErrorType>> {
    let index = repo
        .index()
        .map_err(|e| cause!(ErrorType::FileEnumeration).src(e))?;

    let mut paths = BTreeSet::new();
    for entry in index.iter() {
        match std::str::from_utf8(&entry.path) {
            Ok(rel) => {
                paths.insert(root.join(rel));
            }
            Err(_) => warn!(
                "Skipping index entry with a non UTF-8 path: {}",
                String::from_utf8_lossy(&entry.path)
            ),
        }
    }

    debug!("Found {} tracked files in the index", paths.len());
    Ok(paths)
}

fn walk_paths(root: &Path) -> Result<BTreeSet<PathBuf>, Cause<ErrorType>> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .require_git(false)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    let mut paths = BTreeSet::new();
    for entry in walker {
        let entry = entry.map_err(|e| cause!(ErrorType::FileEnumeration).msg(e.to_string()))?;
        if entry.file_type().is_some_and(|t| t.is_file()) {
            paths.insert(entry.into_path());
        }
    }

    debug!("Found {} files by walking {}", paths.len(), root.display());
    Ok(paths)
}

/// Resolve the directory part of `path` so differently spelled paths to the
/// same entry compare equal, without following a symlink at the leaf.
fn normalize(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map_or_else(|_| path.to_path_buf(), |p| p.join(name)),
        _ => path.to_path_buf(),
    }
}
