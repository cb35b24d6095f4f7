// src/sources/mod.rs

//! Package sources
//!
//! A conversion target is either a path to a local `.deb` or an HTTP(S) URL.
//! A source turns the target into a local file and owns whatever it had to
//! create to do so.

mod local;
mod url;

pub use local::LocalSource;
pub use url::UrlSource;

use crate::error::Result;
use std::path::PathBuf;

/// Provides a local `.deb` file for a conversion target
pub trait PackageSource {
    /// Make the package available locally and return its path
    fn acquire(&mut self, target: &str) -> Result<PathBuf>;

    /// Drop anything created by `acquire`. Safe to call repeatedly.
    fn release(&mut self) -> Result<()>;
}

/// True for targets that should be downloaded
pub fn is_url(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Pick the source for a target
pub fn source_for(target: &str, show_progress: bool) -> Result<Box<dyn PackageSource>> {
    if is_url(target) {
        Ok(Box::new(UrlSource::new(show_progress)?))
    } else {
        Ok(Box::new(LocalSource::new()))
    }
}
