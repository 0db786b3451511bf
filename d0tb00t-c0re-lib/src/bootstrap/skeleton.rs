//! Destination directories for clone and archive targets

use crate::error::{FilesystemSnafu, InstallError};
use snafu::ResultExt;
use std::fs;
use std::path::Path;

/// Create a single directory. Returns `false` if it already existed.
pub fn create_directory(path: &Path) -> Result<bool, InstallError> {
    if path.is_dir() {
        return Ok(false);
    }
    if path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "path exists but is not a directory",
        ))
        .context(FilesystemSnafu { path });
    }
    fs::create_dir_all(path).context(FilesystemSnafu { path })?;
    Ok(true)
}

/// Make sure the parent of `dest` exists so a clone or extraction can
/// create `dest` itself.
pub fn prepare_destination(dest: &Path) -> Result<(), InstallError> {
    if let Some(parent) = dest.parent() {
        create_directory(parent)?;
    }
    Ok(())
}

/// Remove a directory this run created and left half-populated.
pub fn discard_directory(path: &Path) {
    if let Err(e) = fs::remove_dir_all(path) {
        tracing::warn!(path = %path.display(), error = %e, "could not remove partial install");
    }
}
