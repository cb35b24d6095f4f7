// src/arch/mod.rs

//! Arch Linux package generation
//!
//! Arch packages are zstd-compressed tarballs containing:
//! - .PKGINFO: package metadata
//! - .INSTALL: optional install/upgrade/remove hooks
//! - .MTREE: gzipped mtree manifest of every entry
//! - Actual files at their install paths

pub mod assembler;
pub mod layout;
pub mod mtree;
pub mod pkginfo;

pub use assembler::{render_install_script, PackageAssembler, INSTALL_FILE, MTREE_FILE, PKGINFO_FILE};
pub use layout::normalize_layout;
pub use mtree::{BsdtarManifest, ManifestTool};
pub use pkginfo::{PkgInfo, DEFAULT_LICENSE, DEFAULT_PACKAGER};
