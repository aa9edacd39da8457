//! Placeholder identities of the template being customized.

use std::path::{Path, PathBuf};

/// The names a template ships with, which a configuration run replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateProfile {
    /// Developer name written into license and metadata files
    pub developer: String,
    /// GitHub account that hosts the template
    pub github_username: String,
    /// Repository name of the template (hyphenated)
    pub repo_name: String,
    /// Importable package name of the template
    pub package_name: String,
    /// Python version the template targets, `3.<minor>`
    pub python_version: String,
    /// Remote URLs that identify a checkout of the template itself
    pub upstream_urls: Vec<String>,
    /// Directory holding the package, relative to the project root
    pub package_root: PathBuf,
    /// Template-side files that are never rewritten, relative to the project root
    pub self_files: Vec<PathBuf>,
}

impl Default for TemplateProfile {
    fn default() -> Self {
        Self {
            developer: "Tom Silver".to_string(),
            github_username: "tomsilver".to_string(),
            repo_name: "python-starter".to_string(),
            package_name: "python_starter".to_string(),
            python_version: "3.10".to_string(),
            upstream_urls: vec![
                "git@github.com:tomsilver/python-starter.git".to_string(),
                "https://github.com/tomsilver/python-starter.git".to_string(),
            ],
            package_root: PathBuf::from("src"),
            self_files: vec![PathBuf::from("apply_configuration.py")],
        }
    }
}

impl TemplateProfile {
    /// The python version without its dot, as used in tool settings (`py310`).
    #[must_use]
    pub fn compact_python_version(&self) -> String {
        self.python_version.replace('.', "")
    }

    /// Whether `url` points at the template's own repository.
    #[must_use]
    pub fn is_upstream_url(&self, url: &str) -> bool {
        let url = url.trim();
        self.upstream_urls.iter().any(|u| u == url)
    }

    /// Location of the template package under `root`.
    #[must_use]
    pub fn package_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.package_root).join(&self.package_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_python_version() {
        let profile = TemplateProfile::default();
        assert_eq!(profile.compact_python_version(), "310");
    }

    #[test]
    fn test_upstream_urls_match_both_transports() {
        let profile = TemplateProfile::default();
        assert!(profile.is_upstream_url("git@github.com:tomsilver/python-starter.git"));
        assert!(profile.is_upstream_url("https://github.com/tomsilver/python-starter.git\n"));
        assert!(!profile.is_upstream_url("git@github.com:janedoe/python-starter.git"));
    }

    #[test]
    fn test_package_dir() {
        let profile = TemplateProfile::default();
        assert_eq!(
            profile.package_dir(Path::new("/work/repo")),
            PathBuf::from("/work/repo/src/python_starter")
        );
    }
}
