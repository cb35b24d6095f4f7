// src/deb/mod.rs

//! Debian package support
//!
//! A `.deb` is an `ar` container holding `debian-binary`, a control tarball
//! (metadata, maintainer scripts, conffiles) and a data tarball (the files to
//! install). This module extracts both and parses the control record.

pub mod control;
pub mod extractor;

use std::path::PathBuf;

pub use control::{
    normalize_version, parse_control, parse_dependency_list, ControlMetadata, DebArch,
    DeclaredDependency, DependencyList,
};
pub use extractor::DebExtractor;

/// Debian maintainer scripts found in the control tarball
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintainerScripts {
    pub preinst: Option<String>,
    pub postinst: Option<String>,
    pub prerm: Option<String>,
    pub postrm: Option<String>,
}

impl MaintainerScripts {
    /// Script names read from the control tarball, in lifecycle order
    pub const NAMES: [&'static str; 4] = ["preinst", "postinst", "prerm", "postrm"];

    pub fn is_empty(&self) -> bool {
        self.preinst.is_none()
            && self.postinst.is_none()
            && self.prerm.is_none()
            && self.postrm.is_none()
    }

    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "preinst" => Some(&mut self.preinst),
            "postinst" => Some(&mut self.postinst),
            "prerm" => Some(&mut self.prerm),
            "postrm" => Some(&mut self.postrm),
            _ => None,
        }
    }
}

/// An extracted `.deb`
///
/// The directories live inside the workspace of the [`DebExtractor`] that
/// produced this value and disappear when the extractor is cleaned up.
#[derive(Debug, Clone)]
pub struct ExtractedPackage {
    pub control: ControlMetadata,
    /// Unpacked control tarball
    pub control_dir: PathBuf,
    /// Unpacked data tarball, the future package root
    pub data_dir: PathBuf,
    pub scripts: MaintainerScripts,
    /// Paths declared in `conffiles`, in file order
    pub conffiles: Vec<String>,
}
