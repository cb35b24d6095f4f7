// src/error.rs

//! Error types for deb2arch
//!
//! Three categories abort a conversion: extraction, parsing and building.
//! The remaining variants belong to the outer layers (sources, configuration)
//! and to path sanitization. Dependency resolution never produces an error.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed container, missing member, or unsafe/corrupt tar content
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// Missing mandatory control field or malformed control grammar
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Missing external tool or failure while assembling the Arch package
    #[error("Build error: {0}")]
    BuildError(String),

    #[error("Download error: {0}")]
    DownloadError(String),

    /// Package source could not provide a usable file
    #[error("Source error: {0}")]
    SourceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    /// Path attempts to escape its root directory
    #[error("Path traversal rejected: {0}")]
    PathTraversal(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl Error {
    /// True for the categories that abort a conversion run
    pub fn is_abort_category(&self) -> bool {
        matches!(
            self,
            Error::ExtractionError(_) | Error::ParseError(_) | Error::BuildError(_)
        )
    }
}
