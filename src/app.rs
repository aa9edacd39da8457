use crate::common::{CommonParams, ErrorType};
use crate::config::{self, ConfigError, Configuration};
use crate::git::{PRIMARY_BRANCH, ReinitReport, TemplateRepo, TrackedFileSet, github_ssh_url};
use crate::package::{PackageRename, check_destination_free, rename_package_dir};
use crate::substitution::{RewriteReport, SubstitutionMap, rewrite_files};
use crate::template::TemplateProfile;
use crate::ui;

use cause::{Cause, cause};
use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, crate_version};
use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

/// CLI arguments of `apply-configuration`
#[derive(Parser, Debug)]
#[command(
    name = "apply-configuration",
    version = crate_version!(),
    about = "Customize a freshly cloned project template",
    long_about = "Reads config.json, replaces the template's placeholder names in every tracked file, \
                  reinitializes Git on `main`, points `origin` at your GitHub repository and renames \
                  the package directory.",
    styles = get_styles(),
)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonParams,

    /// Configuration file (default: config.json in the project root)
    #[arg(
        short = 'c',
        long = "config",
        help = "Configuration file (default: $STARTER_CONFIG or config.json in the project root)"
    )]
    pub config: Option<PathBuf>,

    /// Project root to configure
    #[arg(
        short = 'C',
        long = "directory",
        help = "Project root to configure (default: current directory)"
    )]
    pub directory: Option<PathBuf>,

    /// Report what would change without touching anything
    #[arg(long, help = "Report what would change without touching anything")]
    pub dry_run: bool,
}

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Magenta.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default().bold())
        .placeholder(AnsiColor::Yellow.on_default())
        .valid(AnsiColor::Blue.on_default().bold())
        .invalid(AnsiColor::Red.on_default().bold())
        .error(AnsiColor::Red.on_default().bold())
}

/// Parse the command-line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Progress of a configuration run. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    ConfigLoaded,
    SubstitutionsComputed,
    FilesRewritten,
    RepoReinitialized,
    PackageRenamed,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ConfigLoaded => "configuration loaded",
            Self::SubstitutionsComputed => "substitutions computed",
            Self::FilesRewritten => "files rewritten",
            Self::RepoReinitialized => "repository reinitialized",
            Self::PackageRenamed => "package renamed",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

impl From<ConfigError> for Cause<ErrorType> {
    fn from(err: ConfigError) -> Self {
        cause!(ErrorType::ConfigLoad, err.to_string()).src(err)
    }
}

/// Everything a run did, or would do in a dry run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stage: Stage,
    pub config: Configuration,
    pub repo_name: String,
    pub remote_url: String,
    pub substitutions: Vec<(String, String)>,
    pub rewrite: RewriteReport,
    pub reinit: Option<ReinitReport>,
    pub package: Option<PackageRename>,
    pub dry_run: bool,
}

/// Applies a configuration file to a project created from a template.
#[derive(Debug, Clone)]
pub struct Configurator {
    root: PathBuf,
    profile: TemplateProfile,
    config_path: Option<PathBuf>,
    dry_run: bool,
    stage: Stage,
}

impl Configurator {
    pub fn new(root: &Path, profile: TemplateProfile) -> Self {
        Self {
            root: root.to_path_buf(),
            profile,
            config_path: None,
            dry_run: false,
            stage: Stage::Idle,
        }
    }

    /// Use this configuration file instead of the default lookup.
    #[must_use]
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, stage: Stage) {
        debug_assert!(stage > self.stage, "stages only move forward");
        info!("{} -> {stage}", self.stage);
        self.stage = stage;
    }

    /// Run the whole pipeline. Any error aborts the run; files already
    /// rewritten stay rewritten.
    pub fn run(&mut self) -> Result<RunSummary, Cause<ErrorType>> {
        let root = self.root.canonicalize().map_err(|e| {
            cause!(ErrorType::ProjectRoot)
                .msg(format!("Cannot resolve project root {}", self.root.display()))
                .src(e)
        })?;
        let repo_name = repository_name(&root)?;

        let config_path = config::resolve_config_path(self.config_path.as_deref(), &root);
        let config = config::load_configuration(&config_path)?;
        self.advance(Stage::ConfigLoaded);

        let map = SubstitutionMap::for_configuration(&self.profile, &config, &repo_name)
            .map_err(|e| cause!(ErrorType::ConfigLoad).src(e))?;
        for (old, new) in map.pairs() {
            debug!("Substitution: {old:?} -> {new:?}");
        }
        self.advance(Stage::SubstitutionsComputed);

        let source = self.profile.package_dir(&root);
        let destination = root
            .join(&self.profile.package_root)
            .join(config.package_name());
        check_destination_free(&source, &destination)?;

        let mut exclude = self.profile.self_files.clone();
        exclude.push(config_path);
        let tracked = TrackedFileSet::collect(&root, &exclude)?;
        if tracked.is_empty() {
            warn!("No files to rewrite under {}", root.display());
        } else {
            info!("Rewriting up to {} files", tracked.len());
        }
        let rewrite = rewrite_files(&map, tracked.files(), self.dry_run)
            .map_err(|e| cause!(ErrorType::FileRewrite).src(e))?;
        self.advance(Stage::FilesRewritten);

        let remote_url = github_ssh_url(config.github_username(), &repo_name);

        let mut summary = RunSummary {
            stage: self.stage,
            config,
            repo_name,
            remote_url,
            substitutions: map.pairs().to_vec(),
            rewrite,
            reinit: None,
            package: None,
            dry_run: self.dry_run,
        };

        if self.dry_run {
            info!("Dry run: leaving the repository and package directory untouched");
            return Ok(summary);
        }

        let repo = TemplateRepo::new(&root);
        summary.reinit = Some(repo.reinitialize(&self.profile, &summary.remote_url)?);
        self.advance(Stage::RepoReinitialized);

        let package = rename_package_dir(&source, &destination)?;
        if matches!(package, PackageRename::Moved { .. }) {
            let git = repo
                .open()
                .map_err(|e| cause!(ErrorType::GitStage).src(e))?;
            TemplateRepo::stage_all(&git)?;
        }
        summary.package = Some(package);
        self.advance(Stage::PackageRenamed);

        self.advance(Stage::Done);
        summary.stage = self.stage;
        Ok(summary)
    }
}

/// Name of the new repository: the project directory's name.
fn repository_name(root: &Path) -> Result<String, Cause<ErrorType>> {
    root.file_name()
        .and_then(|n| n.to_str())
        .map(ToString::to_string)
        .ok_or_else(|| {
            cause!(ErrorType::ProjectRoot).msg(format!(
                "Cannot derive a repository name from {}",
                root.display()
            ))
        })
}

/// Entry point of the `apply-configuration` binary.
pub fn handle_configure(cli: Cli) -> anyhow::Result<()> {
    cli.common.apply();

    let root = match cli.directory {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let mut configurator = Configurator::new(&root, TemplateProfile::default()).dry_run(cli.dry_run);
    if let Some(path) = cli.config {
        configurator = configurator.config_path(path);
    }

    let summary = match configurator.run() {
        Ok(summary) => summary,
        Err(e) => anyhow::bail!("{e} (stopped after: {})", configurator.stage()),
    };
    report(&summary);
    Ok(())
}

fn report(summary: &RunSummary) {
    let rewritten = summary.rewrite.rewritten.iter().map(|p| p.display().to_string());

    if summary.dry_run {
        ui::print_info(&format!(
            "Dry run for repository '{}' (remote {})",
            summary.repo_name, summary.remote_url
        ));
        ui::print_list("Files that would be rewritten:", rewritten);
        ui::print_message(&format!(
            "{} files unchanged, {} skipped",
            summary.rewrite.unchanged,
            summary.rewrite.skipped.len()
        ));
        return;
    }

    ui::print_list("Rewritten files:", rewritten);
    if let Some(reinit) = &summary.reinit {
        if reinit.discarded_upstream {
            ui::print_warning("Removed the template's Git history");
        }
        ui::print_message(&format!(
            "Branch '{PRIMARY_BRANCH}', remote origin -> {}",
            reinit.remote_url
        ));
    }
    if let Some(PackageRename::Moved { to, .. }) = &summary.package {
        ui::print_message(&format!("Package directory: {}", to.display()));
    }
    ui::print_success("Configuration applied successfully.");
}
