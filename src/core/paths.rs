//! Path normalization utilities
//!
//! Cache directories are normalized to use '/' as separator and carry no
//! trailing slash, then checked once when the store is constructed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{CacheError, Result};

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Normalize separators and strip trailing slashes from a directory path
pub fn sanitize_dir(path: &Path) -> PathBuf {
    let normalized = normalize_path(path);
    let trimmed = normalized.trim_end_matches('/');

    if trimmed.is_empty() && normalized.starts_with('/') {
        return PathBuf::from("/");
    }

    PathBuf::from(trimmed)
}

/// Check that a directory exists, is a directory, and is readable and writable.
///
/// Only inspects metadata; nothing is created or written.
pub fn validate_dir(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path)
        .map_err(|e| CacheError::invalid_directory(path, format!("cannot stat: {}", e)))?;

    if !metadata.is_dir() {
        return Err(CacheError::invalid_directory(path, "not a directory"));
    }

    if metadata.permissions().readonly() {
        return Err(CacheError::invalid_directory(path, "not writable"));
    }

    check_access(path)?;

    fs::read_dir(path)
        .map_err(|e| CacheError::invalid_directory(path, format!("not readable: {}", e)))?;

    Ok(())
}

/// Ask the OS whether the current user may list, create and remove entries
#[cfg(unix)]
fn check_access(path: &Path) -> Result<()> {
    use nix::unistd::{access, AccessFlags};

    access(path, AccessFlags::R_OK | AccessFlags::W_OK | AccessFlags::X_OK).map_err(|errno| {
        CacheError::invalid_directory(path, format!("not readable and writable: {}", errno))
    })
}

#[cfg(not(unix))]
fn check_access(_path: &Path) -> Result<()> {
    Ok(())
}
