// Git module providing the repository side of a configuration run

mod files;
mod repository;

// Re-export primary types for public use
pub use files::TrackedFileSet;
pub use repository::{
    PRIMARY_BRANCH, REMOTE_NAME, ReinitReport, RemoteChange, TemplateRepo, github_ssh_url,
};
