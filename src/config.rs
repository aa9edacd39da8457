use log::debug;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name, looked up in the project root
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the configuration file location
pub const CONFIG_ENV: &str = "STARTER_CONFIG";

pub const KEY_DEVELOPER: &str = "developer";
pub const KEY_GITHUB_USERNAME: &str = "github-username";
pub const KEY_PACKAGE_NAME: &str = "your-package-name";
pub const KEY_PYTHON_VERSION: &str = "python-version";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing config file: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file {}: {}", .0.display(), .1)]
    Read(PathBuf, #[source] io::Error),

    #[error("Malformed config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing \"{0}\" in config file")]
    MissingField(&'static str),

    #[error("\"{0}\" must not be empty")]
    EmptyField(&'static str),

    #[error("\"{0}\" must not contain whitespace")]
    Whitespace(&'static str),

    #[error("Package names cannot contain dashes (you want to `import package_name`)")]
    Hyphen,

    #[error("Only Python 3 is supported, got \"{0}\"")]
    NotPython3(String),

    #[error("Missing dot in Python version \"{0}\" (example: 3.10)")]
    MissingDot(String),

    #[error("Python minor version must be a number in \"{0}\" (example: 3.10)")]
    MinorNotNumeric(String),
}

/// The configuration file exactly as written; every field may be absent.
#[derive(Deserialize, Debug, Default)]
struct RawConfiguration {
    developer: Option<String>,
    #[serde(rename = "github-username")]
    github_username: Option<String>,
    #[serde(rename = "your-package-name")]
    package_name: Option<String>,
    #[serde(rename = "python-version")]
    python_version: Option<String>,
}

/// A validated configuration. Only [`Configuration::parse`] and
/// [`load_configuration`] construct one, so every instance is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    developer: String,
    github_username: String,
    package_name: String,
    python_version: String,
}

impl Configuration {
    /// Parse and validate configuration JSON.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfiguration = serde_json::from_str(content)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfiguration) -> Result<Self, ConfigError> {
        let developer = require(raw.developer, KEY_DEVELOPER)?;

        let github_username = require(raw.github_username, KEY_GITHUB_USERNAME)?;
        reject_whitespace(&github_username, KEY_GITHUB_USERNAME)?;

        let package_name = require(raw.package_name, KEY_PACKAGE_NAME)?;
        reject_whitespace(&package_name, KEY_PACKAGE_NAME)?;
        if package_name.contains('-') {
            return Err(ConfigError::Hyphen);
        }

        let python_version = require(raw.python_version, KEY_PYTHON_VERSION)?;
        validate_python_version(&python_version)?;

        Ok(Self {
            developer,
            github_username,
            package_name,
            python_version,
        })
    }

    pub fn developer(&self) -> &str {
        &self.developer
    }

    pub fn github_username(&self) -> &str {
        &self.github_username
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn python_version(&self) -> &str {
        &self.python_version
    }

    /// The digits after `3.`
    pub fn python_minor(&self) -> &str {
        self.python_version
            .strip_prefix("3.")
            .unwrap_or_default()
    }
}

fn require(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    let value = value.ok_or(ConfigError::MissingField(key))?;
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyField(key));
    }
    Ok(value)
}

fn reject_whitespace(value: &str, key: &'static str) -> Result<(), ConfigError> {
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Whitespace(key));
    }
    Ok(())
}

fn validate_python_version(version: &str) -> Result<(), ConfigError> {
    if !version.starts_with('3') {
        return Err(ConfigError::NotPython3(version.to_string()));
    }
    let Some(minor) = version.strip_prefix("3.") else {
        return Err(ConfigError::MissingDot(version.to_string()));
    };
    if minor.is_empty() || !minor.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::MinorNotNumeric(version.to_string()));
    }
    Ok(())
}

/// Read and validate the configuration file at `path`.
pub fn load_configuration(path: &Path) -> Result<Configuration, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content =
        fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let config = Configuration::parse(&content)?;
    debug!("Configuration loaded from {}: {config:?}", path.display());
    Ok(config)
}

/// Locate the configuration file with layered priority:
/// explicit path > `STARTER_CONFIG` > `config.json` in `root`.
///
/// Relative paths are resolved against `root`.
pub fn resolve_config_path(explicit: Option<&Path>, root: &Path) -> PathBuf {
    pick_config_path(explicit, std::env::var_os(CONFIG_ENV), root)
}

fn pick_config_path(explicit: Option<&Path>, env: Option<OsString>, root: &Path) -> PathBuf {
    let chosen = explicit
        .map(Path::to_path_buf)
        .or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from));

    match chosen {
        Some(path) if path.is_absolute() => path,
        Some(path) => root.join(path),
        None => root.join(CONFIG_FILE),
    }
}
