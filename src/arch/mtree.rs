// src/arch/mtree.rs

//! `.MTREE` generation
//!
//! pacman verifies installed files against an mtree manifest shipped in the
//! package. The manifest is produced by `bsdtar --format=mtree` with the same
//! keyword set makepkg uses. Every entry is recorded as owned by root, as the
//! package archive itself is, whoever runs the conversion.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// mtree keywords recorded per entry
const MTREE_OPTIONS: &str = "!all,use-set,type,uid,gid,mode,time,size,md5,sha256,link";

/// Ownership recorded in the manifest, matching the archive headers
const OWNER_ARGS: [&str; 8] = ["--uid", "0", "--gid", "0", "--uname", "root", "--gname", "root"];

/// Produces a plain-text mtree manifest for a package root
pub trait ManifestTool {
    /// Name shown in error messages
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    /// Write the manifest of `entries` (relative to `root`) into `output`
    fn write_manifest(&self, root: &Path, entries: &[PathBuf], output: &Path) -> Result<()>;
}

/// [`ManifestTool`] running `bsdtar`
#[derive(Debug, Clone)]
pub struct BsdtarManifest {
    program: PathBuf,
}

impl Default for BsdtarManifest {
    fn default() -> Self {
        Self {
            program: PathBuf::from("bsdtar"),
        }
    }
}

impl BsdtarManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ManifestTool for BsdtarManifest {
    fn name(&self) -> &str {
        self.program.to_str().unwrap_or("bsdtar")
    }

    fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn write_manifest(&self, root: &Path, entries: &[PathBuf], output: &Path) -> Result<()> {
        if !self.is_available() {
            return Err(Error::BuildError(format!(
                "{} is required but not found",
                self.name()
            )));
        }

        debug!("Running {} mtree over {} entries", self.name(), entries.len());

        let result = Command::new(&self.program)
            .env("LANG", "C")
            .arg("-cf")
            .arg(output)
            .arg("--format=mtree")
            .arg(format!("--options={}", MTREE_OPTIONS))
            .args(OWNER_ARGS)
            .arg("-C")
            .arg(root)
            .args(entries)
            .output()
            .map_err(|e| {
                Error::BuildError(format!("Failed to run {}: {}", self.name(), e))
            })?;

        if !result.status.success() {
            return Err(Error::BuildError(format!(
                "{} mtree generation failed ({}): {}",
                self.name(),
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        Ok(())
    }
}
