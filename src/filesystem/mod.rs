// src/filesystem/mod.rs

//! Filesystem helpers shared by the extractor and the assembler
//!
//! - Path sanitization for untrusted archive entries
//! - Installed size calculation over an extracted tree

pub mod path;

use crate::error::{Error, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Sum the sizes of all regular files below `root`
///
/// Symlinks are not followed and count as zero bytes, matching how pacman
/// accounts installed size.
pub fn tree_size(root: &Path) -> Result<u64> {
    let mut total = 0u64;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            Error::IoError(format!("Failed to walk {}: {}", root.display(), e))
        })?;

        if entry.file_type().is_file() {
            let metadata = entry.metadata().map_err(|e| {
                Error::IoError(format!("Failed to stat {}: {}", entry.path().display(), e))
            })?;
            total += metadata.len();
        }
    }

    Ok(total)
}
