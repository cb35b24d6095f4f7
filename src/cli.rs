// src/cli.rs
//! CLI definitions for deb2arch
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deb2arch")]
#[command(version)]
#[command(about = "Convert Debian .deb packages into Arch Linux packages", long_about = None)]
pub struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/deb2arch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a .deb (local path or URL) into a .pkg.tar.zst
    Convert {
        /// Path or http(s) URL of the .deb
        target: String,

        /// Output directory (default: from config, else current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Install the result with `pacman -U` afterwards
        #[arg(long)]
        install: bool,

        /// Only print errors and the resulting path
        #[arg(short, long)]
        quiet: bool,

        /// Dependency mappings file with a [mappings] table
        #[arg(long)]
        mappings: Option<PathBuf>,

        /// Wrap Debian maintainer scripts into .INSTALL
        #[arg(long)]
        include_scripts: bool,

        /// Package release number (pkgrel)
        #[arg(long)]
        release: Option<u32>,

        /// Do not consult pkgfile for unknown dependencies
        #[arg(long)]
        no_pkgfile: bool,
    },

    /// Show the control metadata of a .deb
    Inspect {
        /// Path to the .deb
        deb: PathBuf,
    },

    /// Show how Debian dependency names resolve to Arch packages
    Resolve {
        /// Debian package names
        #[arg(required = true)]
        deps: Vec<String>,

        /// Dependency mappings file with a [mappings] table
        #[arg(long)]
        mappings: Option<PathBuf>,
    },
}
