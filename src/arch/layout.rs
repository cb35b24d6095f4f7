// src/arch/layout.rs

//! Package root layout fixes
//!
//! Arch uses a merged `/usr`: `/bin`, `/sbin`, `/lib` and `/lib64` are
//! symlinks owned by the `filesystem` package. A package shipping files
//! there would conflict with it, so the content is moved under `usr/`.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Legacy top-level directory and where its content belongs
pub const LEGACY_DIRS: [(&str, &str); 4] = [
    ("bin", "usr/bin"),
    ("sbin", "usr/bin"),
    ("lib", "usr/lib"),
    ("lib64", "usr/lib"),
];

/// Move legacy top-level directories under `usr/`
///
/// On a name collision the moved entry replaces what was there. Legacy
/// entries that are symlinks are removed, never followed. Running this twice
/// leaves the tree unchanged.
pub fn normalize_layout(root: &Path) -> Result<()> {
    for (legacy, dest) in LEGACY_DIRS {
        let src = root.join(legacy);
        let Ok(meta) = fs::symlink_metadata(&src) else {
            continue;
        };

        if meta.file_type().is_symlink() {
            debug!("Removing legacy symlink /{}", legacy);
            fs::remove_file(&src).map_err(|e| layout_error(&src, e))?;
            continue;
        }

        if !meta.is_dir() {
            warn!("Leaving non-directory /{} in place", legacy);
            continue;
        }

        debug!("Moving /{} into /{}", legacy, dest);
        merge_dir(&src, &root.join(dest))?;
        fs::remove_dir(&src).map_err(|e| layout_error(&src, e))?;
    }

    Ok(())
}

/// Move every entry of `src` into `dest`, recursing where both are directories
fn merge_dir(src: &Path, dest: &Path) -> Result<()> {
    if let Ok(meta) = fs::symlink_metadata(dest)
        && !meta.is_dir()
    {
        remove_any(dest)?;
    }
    fs::create_dir_all(dest).map_err(|e| layout_error(dest, e))?;

    let mut entries: Vec<_> = fs::read_dir(src)
        .map_err(|e| layout_error(src, e))?
        .collect::<std::io::Result<_>>()
        .map_err(|e| layout_error(src, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let from_is_dir = entry.file_type().map_err(|e| layout_error(&from, e))?.is_dir();
        let to_meta = fs::symlink_metadata(&to).ok();

        match to_meta {
            Some(meta) if from_is_dir && meta.is_dir() => {
                merge_dir(&from, &to)?;
                fs::remove_dir(&from).map_err(|e| layout_error(&from, e))?;
            }
            Some(_) => {
                debug!("Replacing {} with {}", to.display(), from.display());
                remove_any(&to)?;
                fs::rename(&from, &to).map_err(|e| layout_error(&from, e))?;
            }
            None => {
                fs::rename(&from, &to).map_err(|e| layout_error(&from, e))?;
            }
        }
    }

    Ok(())
}

fn remove_any(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path).map_err(|e| layout_error(path, e))?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
    .map_err(|e| layout_error(path, e))
}

fn layout_error(path: &Path, e: std::io::Error) -> Error {
    Error::BuildError(format!("Failed to rearrange {}: {}", path.display(), e))
}

/// Set the modification time of every file and directory below `root`
///
/// Symlinks keep their own timestamps. Entries that cannot be touched are
/// logged and skipped.
pub fn clamp_mtimes(root: &Path, timestamp: i64) -> Result<()> {
    let time = UNIX_EPOCH + Duration::from_secs(timestamp.max(0) as u64);

    // Children before parents so touching a file does not bump its directory
    for entry in WalkDir::new(root).follow_links(false).contents_first(true) {
        let entry = entry.map_err(|e| {
            Error::BuildError(format!("Failed to walk {}: {}", root.display(), e))
        })?;
        if entry.file_type().is_symlink() {
            continue;
        }
        if let Err(e) = set_mtime(entry.path(), time) {
            debug!("Cannot set mtime on {}: {}", entry.path().display(), e);
        }
    }

    Ok(())
}

fn set_mtime(path: &Path, time: SystemTime) -> std::io::Result<()> {
    File::open(path)?.set_modified(time)
}
