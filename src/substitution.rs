//! Literal multi-key text substitution.
//!
//! All keys of a [`SubstitutionMap`] are matched in a single left-to-right
//! scan, so text produced by one replacement is never matched again by
//! another key. When several keys match at the same position the longest
//! one wins.

use crate::config::Configuration;
use crate::template::TemplateProfile;

use log::debug;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Ordered literal old → new text pairs.
#[derive(Debug, Clone)]
pub struct SubstitutionMap {
    pairs: Vec<(String, String)>,
    replacements: HashMap<String, String>,
    pattern: Option<Regex>,
}

impl SubstitutionMap {
    /// Build a map from `(old, new)` pairs.
    ///
    /// Pairs with an empty key or with identical key and value are dropped.
    /// A repeated key keeps its first value.
    pub fn new<I, K, V>(pairs: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut kept: Vec<(String, String)> = Vec::new();
        let mut replacements = HashMap::new();

        for (old, new) in pairs {
            let (old, new) = (old.into(), new.into());
            if old.is_empty() || old == new || replacements.contains_key(&old) {
                debug!("Dropping substitution {old:?} -> {new:?}");
                continue;
            }
            replacements.insert(old.clone(), new.clone());
            kept.push((old, new));
        }

        let pattern = if kept.is_empty() {
            None
        } else {
            // The regex engine prefers earlier alternatives at a given
            // position, so listing longer keys first yields the longest match.
            let mut keys: Vec<&str> = kept.iter().map(|(k, _)| k.as_str()).collect();
            keys.sort_by(|a, b| b.len().cmp(&a.len()));
            let alternation = keys
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alternation)?)
        };

        Ok(Self {
            pairs: kept,
            replacements,
            pattern,
        })
    }

    /// Derive the substitutions for a configuration run.
    pub fn for_configuration(
        profile: &TemplateProfile,
        config: &Configuration,
        repo_name: &str,
    ) -> Result<Self, regex::Error> {
        let minor = config.python_minor();
        Self::new([
            (profile.developer.clone(), config.developer().to_string()),
            (
                profile.github_username.clone(),
                config.github_username().to_string(),
            ),
            (profile.repo_name.clone(), repo_name.to_string()),
            (
                profile.package_name.clone(),
                config.package_name().to_string(),
            ),
            (profile.python_version.clone(), format!("3.{minor}")),
            (profile.compact_python_version(), format!("3{minor}")),
        ])
    }

    /// The effective pairs, in insertion order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Replace every key occurrence in one pass. Borrows `text` when nothing matched.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let Some(pattern) = &self.pattern else {
            return Cow::Borrowed(text);
        };
        pattern.replace_all(text, |caps: &Captures| {
            self.replacements
                .get(&caps[0])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
    }
}

/// Why a file was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Directory,
    Symlink,
    Missing,
    Binary,
}

/// Outcome of rewriting a set of files.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    /// Files whose content changed (or would change, in a dry run)
    pub rewritten: Vec<PathBuf>,
    /// Number of text files with no occurrences of any key
    pub unchanged: usize,
    pub skipped: Vec<(PathBuf, SkipReason)>,
}

impl RewriteReport {
    pub fn is_rewritten(&self, path: &Path) -> bool {
        self.rewritten.iter().any(|p| p == path)
    }
}

/// Apply `map` to each file in `files`, writing back only changed content.
///
/// Directories, symlinks, vanished paths and binary files are skipped.
/// With `dry_run` the files are classified but never written.
pub fn rewrite_files(
    map: &SubstitutionMap,
    files: &[PathBuf],
    dry_run: bool,
) -> io::Result<RewriteReport> {
    let mut report = RewriteReport::default();

    for path in files {
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Skipping vanished file: {}", path.display());
                report.skipped.push((path.clone(), SkipReason::Missing));
                continue;
            }
            Err(e) => return Err(e),
        };

        if metadata.is_dir() {
            report.skipped.push((path.clone(), SkipReason::Directory));
            continue;
        }
        if metadata.file_type().is_symlink() {
            debug!("Skipping symlink: {}", path.display());
            report.skipped.push((path.clone(), SkipReason::Symlink));
            continue;
        }

        let bytes = fs::read(path)?;
        let Some(content) = as_text(&bytes) else {
            debug!("Skipping binary file: {}", path.display());
            report.skipped.push((path.clone(), SkipReason::Binary));
            continue;
        };

        match map.apply(content) {
            Cow::Owned(updated) if updated != content => {
                debug!("Rewriting {}", path.display());
                if !dry_run {
                    fs::write(path, updated)?;
                }
                report.rewritten.push(path.clone());
            }
            _ => report.unchanged += 1,
        }
    }

    Ok(report)
}

/// Interpret `bytes` as text, rejecting content that looks binary.
fn as_text(bytes: &[u8]) -> Option<&str> {
    if bytes.contains(&0) {
        return None;
    }
    std::str::from_utf8(bytes).ok()
}
