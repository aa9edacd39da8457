pub mod app;
pub mod common;
pub mod config;
pub mod git;
pub mod logger;
pub mod package;
pub mod substitution;
pub mod template;
pub mod ui;

// Re-export important structs and functions for easier testing
pub use app::{Configurator, RunSummary, Stage};
pub use common::ErrorType;
pub use config::{ConfigError, Configuration, load_configuration};
pub use substitution::{RewriteReport, SkipReason, SubstitutionMap};
pub use template::TemplateProfile;
