use crate::common::ErrorType;
use crate::template::TemplateProfile;

use cause::{Cause, cause};
use git2::{BranchType, ErrorCode, IndexAddOption, Repository, RepositoryInitOptions};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the remote pointing at the new project's repository
pub const REMOTE_NAME: &str = "origin";

/// Primary branch of a reinitialized repository
pub const PRIMARY_BRANCH: &str = "main";

/// SSH URL of a GitHub repository.
pub fn github_ssh_url(username: &str, repo_name: &str) -> String {
    format!("git@github.com:{username}/{repo_name}.git")
}

/// What happened to the remote when it was configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteChange {
    Added,
    Updated,
}

/// Outcome of reinitializing version control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReinitReport {
    /// Whether `.git` belonged to the template and was deleted
    pub discarded_upstream: bool,
    /// Whether a new repository was created
    pub created: bool,
    pub remote_url: String,
    pub remote_change: RemoteChange,
}

/// The git repository of a project created from a template.
pub struct TemplateRepo {
    root: PathBuf,
}

impl TemplateRepo {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn git_dir(&self) -> PathBuf {
        self.root.join(".git")
    }

    pub fn exists(&self) -> bool {
        self.git_dir().exists()
    }

    /// Open the repository at the project root, without searching parent directories.
    pub fn open(&self) -> Result<Repository, git2::Error> {
        Repository::open(&self.root)
    }

    /// URLs of all configured remotes.
    pub fn remote_urls(repo: &Repository) -> Result<Vec<String>, git2::Error> {
        let names = repo.remotes()?;
        let mut urls = Vec::new();
        for name in names.iter().flatten() {
            let remote = repo.find_remote(name)?;
            if let Some(url) = remote.url() {
                urls.push(url.to_string());
            }
        }
        Ok(urls)
    }

    /// Whether the existing `.git` is a checkout of the template itself.
    pub fn is_upstream_checkout(&self, profile: &TemplateProfile) -> Result<bool, Cause<ErrorType>> {
        if !self.exists() {
            return Ok(false);
        }

        match self.open() {
            Ok(repo) => {
                let urls = Self::remote_urls(&repo)
                    .map_err(|e| cause!(ErrorType::UpstreamDetection).src(e))?;
                debug!("Existing remotes: {urls:?}");
                Ok(urls.iter().any(|url| profile.is_upstream_url(url)))
            }
            Err(e) => {
                // Fall back to the raw config text when libgit2 cannot open the repository.
                warn!("Cannot open existing repository ({e}), inspecting .git/config directly");
                let config = fs::read_to_string(self.git_dir().join("config")).map_err(|e| {
                    cause!(ErrorType::UpstreamDetection)
                        .msg("Cannot read .git/config of the existing repository")
                        .src(e)
                })?;
                Ok(profile
                    .upstream_urls
                    .iter()
                    .any(|url| config.contains(url.as_str())))
            }
        }
    }

    /// Delete `.git` when it belongs to the template. Returns whether it was deleted.
    pub fn discard_upstream_metadata(
        &self,
        profile: &TemplateProfile,
    ) -> Result<bool, Cause<ErrorType>> {
        if !self.is_upstream_checkout(profile)? {
            return Ok(false);
        }

        let git_dir = self.git_dir();
        info!("Removing template history at {}", git_dir.display());
        let removed = if git_dir.is_dir() {
            fs::remove_dir_all(&git_dir)
        } else {
            fs::remove_file(&git_dir)
        };
        removed.map_err(|e| cause!(ErrorType::GitMetadataRemove).src(e))?;
        Ok(true)
    }

    /// Open the existing repository, or create one whose initial branch is `main`.
    ///
    /// Returns the repository and whether it was newly created.
    pub fn open_or_init(&self) -> Result<(Repository, bool), Cause<ErrorType>> {
        if self.exists() {
            let repo = self
                .open()
                .map_err(|e| cause!(ErrorType::GitInit).src(e))?;
            debug!("Reusing existing repository at {}", self.root.display());
            return Ok((repo, false));
        }

        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(PRIMARY_BRANCH);
        let repo = Repository::init_opts(&self.root, &opts)
            .map_err(|e| cause!(ErrorType::GitInit).src(e))?;
        info!("Initialized empty repository at {}", self.root.display());
        Ok((repo, true))
    }

    /// Make `branch` the checked out branch name.
    ///
    /// An unborn HEAD is pointed at `branch`. A named branch is renamed to
    /// `branch` unless a branch of that name already exists.
    pub fn ensure_branch(repo: &Repository, branch: &str) -> Result<(), Cause<ErrorType>> {
        let target = format!("refs/heads/{branch}");
        let to_cause = |e: git2::Error| cause!(ErrorType::GitBranch).src(e);

        let head = match repo.head() {
            Ok(head) => head,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                debug!("HEAD is unborn, pointing it at {target}");
                return repo.set_head(&target).map_err(to_cause);
            }
            Err(e) => return Err(to_cause(e)),
        };

        if head.is_branch() && head.shorthand() == Some(branch) {
            return Ok(());
        }

        if repo.find_branch(branch, BranchType::Local).is_ok() {
            warn!(
                "Branch '{branch}' already exists but is not checked out, leaving HEAD at {}",
                head.shorthand().unwrap_or("HEAD")
            );
            return Ok(());
        }

        if head.is_branch() {
            let current = head.shorthand().unwrap_or_default().to_string();
            let mut current_branch = repo
                .find_branch(&current, BranchType::Local)
                .map_err(to_cause)?;
            current_branch.rename(branch, false).map_err(to_cause)?;
            info!("Renamed branch '{current}' to '{branch}'");
        } else {
            let commit = head.peel_to_commit().map_err(to_cause)?;
            repo.branch(branch, &commit, false).map_err(to_cause)?;
            info!("Created branch '{branch}' from detached HEAD");
        }
        repo.set_head(&target).map_err(to_cause)
    }

    /// Stage every file in the working tree, honoring `.gitignore`.
    ///
    /// Index entries whose files no longer exist are removed.
    pub fn stage_all(repo: &Repository) -> Result<(), Cause<ErrorType>> {
        let to_cause = |e: git2::Error| cause!(ErrorType::GitStage).src(e);
        let mut index = repo.index().map_err(to_cause)?;
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .map_err(to_cause)?;
        index.update_all(["*"].iter(), None).map_err(to_cause)?;
        index.write().map_err(to_cause)?;
        debug!("Staged {} entries", index.len());
        Ok(())
    }

    /// Point remote `name` at `url`, adding it when missing.
    pub fn set_remote(
        repo: &Repository,
        name: &str,
        url: &str,
    ) -> Result<RemoteChange, Cause<ErrorType>> {
        let to_cause = |e: git2::Error| cause!(ErrorType::GitRemote).src(e);
        match repo.find_remote(name) {
            Ok(_) => {
                repo.remote_set_url(name, url).map_err(to_cause)?;
                debug!("Updated remote '{name}' to {url}");
                Ok(RemoteChange::Updated)
            }
            Err(e) if e.code() == ErrorCode::NotFound => {
                repo.remote(name, url).map_err(to_cause)?;
                debug!("Added remote '{name}' at {url}");
                Ok(RemoteChange::Added)
            }
            Err(e) => Err(to_cause(e)),
        }
    }

    /// Discard template history, initialize fresh state on `main`, stage
    /// everything and point `origin` at `remote_url`.
    pub fn reinitialize(
        &self,
        profile: &TemplateProfile,
        remote_url: &str,
    ) -> Result<ReinitReport, Cause<ErrorType>> {
        let discarded_upstream = self.discard_upstream_metadata(profile)?;
        let (repo, created) = self.open_or_init()?;
        Self::ensure_branch(&repo, PRIMARY_BRANCH)?;
        Self::stage_all(&repo)?;
        let remote_change = Self::set_remote(&repo, REMOTE_NAME, remote_url)?;

        Ok(ReinitReport {
            discarded_upstream,
            created,
            remote_url: remote_url.to_string(),
            remote_change,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_with_remote(root: &Path, url: &str) -> Repository {
        let repo = Repository::init(root).expect("Failed to init repository");
        repo.remote(REMOTE_NAME, url).expect("Failed to add remote");
        repo
    }

    #[test]
    fn test_github_ssh_url() {
        assert_eq!(
            github_ssh_url("janedoe", "my-repo"),
            "git@github.com:janedoe/my-repo.git"
        );
    }

    #[test]
    fn test_upstream_detection() {
        let profile = TemplateProfile::default();

        let upstream = tempfile::tempdir().expect("Failed to create temp dir");
        init_with_remote(upstream.path(), "https://github.com/tomsilver/python-starter.git");
        assert!(
            TemplateRepo::new(upstream.path())
                .is_upstream_checkout(&profile)
                .expect("detection")
        );

        let fork = tempfile::tempdir().expect("Failed to create temp dir");
        init_with_remote(fork.path(), "git@github.com:janedoe/my-repo.git");
        assert!(
            !TemplateRepo::new(fork.path())
                .is_upstream_checkout(&profile)
                .expect("detection")
        );

        let bare = tempfile::tempdir().expect("Failed to create temp dir");
        assert!(
            !TemplateRepo::new(bare.path())
                .is_upstream_checkout(&profile)
                .expect("detection")
        );
    }

    #[test]
    fn test_set_remote_is_idempotent() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let repo = Repository::init(dir.path()).expect("Failed to init repository");

        let first = TemplateRepo::set_remote(&repo, REMOTE_NAME, "git@github.com:a/b.git")
            .expect("Failed to add remote");
        let second = TemplateRepo::set_remote(&repo, REMOTE_NAME, "git@github.com:c/d.git")
            .expect("Failed to update remote");

        assert_eq!(first, RemoteChange::Added);
        assert_eq!(second, RemoteChange::Updated);
        let remote = repo.find_remote(REMOTE_NAME).expect("remote");
        assert_eq!(remote.url(), Some("git@github.com:c/d.git"));
    }

    #[test]
    fn test_ensure_branch_on_unborn_head() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("master");
        let repo = Repository::init_opts(dir.path(), &opts).expect("Failed to init repository");

        TemplateRepo::ensure_branch(&repo, PRIMARY_BRANCH).expect("Failed to set branch");

        let head = repo.find_reference("HEAD").expect("HEAD");
        assert_eq!(head.symbolic_target(), Some("refs/heads/main"));
    }

    fn commit_file(repo: &Repository, name: &str) -> git2::Oid {
        let root = repo.workdir().expect("workdir");
        fs::write(root.join(name), name).expect("write");
        let mut index = repo.index().expect("index");
        index.add_path(Path::new(name)).expect("Failed to stage file");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = repo.find_tree(tree_id).expect("tree");
        let sig = git2::Signature::now("Test", "test@example.com").expect("signature");
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, name, &tree, &parents)
            .expect("Failed to commit")
    }

    fn init_on(root: &Path, branch: &str) -> Repository {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(branch);
        Repository::init_opts(root, &opts).expect("Failed to init repository")
    }

    #[test]
    fn test_ensure_branch_renames_current_branch() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let repo = init_on(dir.path(), "master");
        let commit = commit_file(&repo, "a.txt");

        TemplateRepo::ensure_branch(&repo, PRIMARY_BRANCH).expect("Failed to set branch");

        let head = repo.head().expect("HEAD");
        assert_eq!(head.name(), Some("refs/heads/main"));
        assert_eq!(head.target(), Some(commit));
        assert!(repo.find_branch("master", BranchType::Local).is_err());
    }

    #[test]
    fn test_ensure_branch_keeps_head_when_main_exists() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let repo = init_on(dir.path(), "main");
        commit_file(&repo, "a.txt");
        let tip = repo.head().and_then(|h| h.peel_to_commit()).expect("commit");
        repo.branch("dev", &tip, false).expect("Failed to create branch");
        repo.set_head("refs/heads/dev").expect("Failed to switch branch");

        TemplateRepo::ensure_branch(&repo, PRIMARY_BRANCH).expect("Failed to set branch");

        assert_eq!(repo.head().expect("HEAD").name(), Some("refs/heads/dev"));
        assert!(repo.find_branch("main", BranchType::Local).is_ok());
    }

    #[test]
    fn test_ensure_branch_from_detached_head() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let repo = init_on(dir.path(), "master");
        let commit = commit_file(&repo, "a.txt");
        repo.set_head_detached(commit).expect("Failed to detach HEAD");

        TemplateRepo::ensure_branch(&repo, PRIMARY_BRANCH).expect("Failed to set branch");

        let head = repo.head().expect("HEAD");
        assert_eq!(head.name(), Some("refs/heads/main"));
        assert_eq!(head.target(), Some(commit));
    }

    #[test]
    fn test_upstream_detection_from_raw_config() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        init_with_remote(root, "git@github.com:tomsilver/python-starter.git");
        fs::remove_file(root.join(".git/HEAD")).expect("Failed to remove HEAD");

        let repo = TemplateRepo::new(root);
        assert!(repo.open().is_err());
        assert!(
            repo.is_upstream_checkout(&TemplateProfile::default())
                .expect("detection")
        );
    }

    #[test]
    fn test_reinitialize_replaces_upstream_history() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        init_with_remote(root, "git@github.com:tomsilver/python-starter.git");
        fs::write(root.join("README.md"), "# project").expect("write");

        let report = TemplateRepo::new(root)
            .reinitialize(&TemplateProfile::default(), "git@github.com:janedoe/project.git")
            .expect("Failed to reinitialize");

        assert!(report.discarded_upstream);
        assert!(report.created);
        assert_eq!(report.remote_change, RemoteChange::Added);

        let repo = Repository::open(root).expect("open");
        assert!(repo.index().expect("index").get_path(Path::new("README.md"), 0).is_some());
        let head = repo.find_reference("HEAD").expect("HEAD");
        assert_eq!(head.symbolic_target(), Some("refs/heads/main"));
    }
}
