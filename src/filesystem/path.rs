// src/filesystem/path.rs

//! Path sanitization utilities for security
//!
//! Tarballs inside a `.deb` are untrusted input. These helpers decide whether
//! an archive entry (or a symlink target) stays inside the extraction root.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Sanitize a tar entry path from an untrusted archive
///
/// This function:
/// 1. Rejects absolute paths (a leading `/`)
/// 2. Rejects any `..` (parent directory) component
/// 3. Skips `.` (current directory) components
///
/// Returns `Ok(None)` for entries that name the archive root itself (`./`),
/// which carry nothing to extract.
///
/// # Examples
///
/// ```
/// use deb2arch::filesystem::path::sanitize_archive_path;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     sanitize_archive_path("./usr/bin/hello").unwrap(),
///     Some(PathBuf::from("usr/bin/hello"))
/// );
/// assert_eq!(sanitize_archive_path("./").unwrap(), None);
/// assert!(sanitize_archive_path("/etc/passwd").is_err());
/// assert!(sanitize_archive_path("usr/../../etc/passwd").is_err());
/// ```
pub fn sanitize_archive_path(path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(path_str.to_string()));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::PathTraversal(format!(
                    "absolute path in archive: {}",
                    path_str
                )));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Ok(None);
    }

    Ok(Some(normalized))
}

/// Check that a symlink stored at `link` (relative to the extraction root)
/// pointing at `target` resolves inside the root
///
/// Absolute targets are always refused.
pub fn link_target_within_root(link: &Path, target: &Path) -> bool {
    if target.has_root() {
        return false;
    }

    // Depth of the directory holding the link
    let mut depth: usize = link
        .parent()
        .map(|p| p.components().filter(|c| matches!(c, Component::Normal(_))).count())
        .unwrap_or(0);

    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }

    true
}

/// Sanitize a filename (single path component) from an untrusted source
///
/// Used for file names derived from download URLs.
///
/// # Examples
///
/// ```
/// use deb2arch::filesystem::path::sanitize_filename;
///
/// assert_eq!(sanitize_filename("hello_2.10-3_amd64.deb").unwrap(), "hello_2.10-3_amd64.deb");
/// assert!(sanitize_filename("../hello.deb").is_err());
/// assert!(sanitize_filename("subdir/hello.deb").is_err());
/// ```
pub fn sanitize_filename(name: &str) -> Result<String> {
    if name.contains('/') || name.contains('\\') {
        return Err(Error::PathTraversal(format!(
            "Filename contains path separator: {}",
            name
        )));
    }

    if name == ".." || name == "." {
        return Err(Error::PathTraversal(format!("Invalid filename: {}", name)));
    }

    if name.is_empty() {
        return Err(Error::InvalidPath("Empty filename".to_string()));
    }

    Ok(name.to_string())
}
