//! Renaming of the template's package directory.

use crate::common::ErrorType;

use cause::{Cause, cause};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of [`rename_package_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageRename {
    Moved { from: PathBuf, to: PathBuf },
    /// The new package name equals the template's
    Unchanged(PathBuf),
}

impl PackageRename {
    /// Where the package lives after the rename.
    pub fn destination(&self) -> &Path {
        match self {
            Self::Moved { to, .. } => to,
            Self::Unchanged(path) => path,
        }
    }
}

/// Fail early when a rename of an existing `source` would hit an existing
/// `destination`. A missing source is left for [`rename_package_dir`] to report.
pub fn check_destination_free(source: &Path, destination: &Path) -> Result<(), Cause<ErrorType>> {
    if source == destination || !source.is_dir() {
        return Ok(());
    }

    // symlink_metadata also catches dangling symlinks at the destination.
    if fs::symlink_metadata(destination).is_ok() {
        return Err(cause!(ErrorType::PackageDestinationExists).msg(format!(
            "Cannot rename package: {} already exists",
            destination.display()
        )));
    }
    Ok(())
}

/// Move `source` to `destination` in a single rename.
///
/// Fails when the source is missing or the destination exists; nothing is
/// merged and nothing is moved in either case.
pub fn rename_package_dir(
    source: &Path,
    destination: &Path,
) -> Result<PackageRename, Cause<ErrorType>> {
    if source == destination {
        debug!("Package directory {} keeps its name", source.display());
        return Ok(PackageRename::Unchanged(source.to_path_buf()));
    }

    if !source.is_dir() {
        return Err(cause!(ErrorType::PackageSourceMissing).msg(format!(
            "Package directory {} does not exist",
            source.display()
        )));
    }

    check_destination_free(source, destination)?;

    fs::rename(source, destination).map_err(|e| {
        cause!(ErrorType::PackageRename)
            .msg(format!(
                "Failed to move {} to {}",
                source.display(),
                destination.display()
            ))
            .src(e)
    })?;

    info!(
        "Moved package {} to {}",
        source.display(),
        destination.display()
    );
    Ok(PackageRename::Moved {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
    })
}
