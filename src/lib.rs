// src/lib.rs

//! deb2arch
//!
//! Converts Debian binary packages (`.deb`) into Arch Linux packages
//! (`.pkg.tar.zst`).
//!
//! # Architecture
//!
//! - `deb`: container extraction and control file parsing
//! - `deps`: Debian → Arch dependency name resolution, tier by tier
//! - `arch`: layout fixes, `.PKGINFO`/`.INSTALL`/`.MTREE`, final archive
//! - `converter`: the pipeline tying the three together
//! - `sources`, `config`: where packages and settings come from

pub mod arch;
pub mod compression;
pub mod config;
pub mod converter;
pub mod deb;
pub mod deps;
mod error;
pub mod filesystem;
pub mod sources;

pub use arch::{PackageAssembler, PkgInfo};
pub use converter::{ConversionOutcome, Converter, ConverterOptions};
pub use deb::{ControlMetadata, DebArch, DebExtractor, ExtractedPackage};
pub use deps::{DependencyMapping, DependencyResolver, MappingSource, MappingStatus};
pub use error::{Error, Result};
