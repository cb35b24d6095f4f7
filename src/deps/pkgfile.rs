// src/deps/pkgfile.rs

//! File-ownership lookup against the Arch file database
//!
//! A Debian package is often named after the binary or library file it
//! ships. `pkgfile` answers which Arch package owns a file of that name, which
//! gives the resolver one more chance before falling back to heuristics.

use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// External "which package owns this file" capability
pub trait FileOwnerLookup {
    /// Whether the backing tool can be used at all
    fn is_available(&self) -> bool;

    /// Owning Arch package for `name`, if any
    fn lookup(&self, name: &str) -> Option<String>;
}

/// [`FileOwnerLookup`] backed by the `pkgfile` command
#[derive(Debug, Clone)]
pub struct PkgfileLookup {
    program: PathBuf,
}

impl Default for PkgfileLookup {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pkgfile"),
        }
    }
}

impl PkgfileLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable in place of `pkgfile`
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn query(&self, args: &[&str]) -> Option<String> {
        let output = Command::new(&self.program).args(args).output().ok()?;
        if !output.status.success() {
            return None;
        }
        first_package(&String::from_utf8_lossy(&output.stdout))
    }
}

impl FileOwnerLookup for PkgfileLookup {
    fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn lookup(&self, name: &str) -> Option<String> {
        // Binaries first, then any file of that name
        let found = self
            .query(&["-b", name])
            .or_else(|| self.query(&[name]));
        debug!("pkgfile lookup {} -> {:?}", name, found);
        found
    }
}

/// First package in `pkgfile` output, without its `repo/` prefix
fn first_package(stdout: &str) -> Option<String> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    let name = line.rsplit('/').next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
