use clap::Args;

/// Steps of a configuration run that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    ConfigLoad,
    ProjectRoot,
    FileEnumeration,
    FileRewrite,
    UpstreamDetection,
    GitMetadataRemove,
    GitInit,
    GitBranch,
    GitStage,
    GitRemote,
    PackageSourceMissing,
    PackageDestinationExists,
    PackageRename,
}

#[derive(Args, Clone, Debug, Default)]
pub struct CommonParams {
    /// Suppress non-essential output
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress non-essential output"
    )]
    pub quiet: bool,

    /// Log debug messages to stderr
    #[arg(
        short = 'l',
        long = "log",
        global = true,
        help = "Log debug messages to stderr"
    )]
    pub log: bool,
}

impl CommonParams {
    /// Install logging and output preferences for this process.
    pub fn apply(&self) {
        crate::logger::init(self.log);
        crate::ui::set_quiet_mode(self.quiet);
    }
}
