// src/sources/local.rs

use super::PackageSource;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A `.deb` already on disk
#[derive(Debug, Default)]
pub struct LocalSource;

impl LocalSource {
    pub fn new() -> Self {
        Self
    }
}

impl PackageSource for LocalSource {
    fn acquire(&mut self, target: &str) -> Result<PathBuf> {
        let path = Path::new(target);
        if !path.exists() {
            return Err(Error::SourceError(format!("File not found: {}", path.display())));
        }
        if !path.is_file() {
            return Err(Error::SourceError(format!("Not a file: {}", path.display())));
        }

        debug!("Using local package {}", path.display());
        Ok(path.to_path_buf())
    }

    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = LocalSource::new().acquire("/nonexistent/hello.deb").unwrap_err();
        assert!(matches!(err, Error::SourceError(ref m) if m.contains("File not found")));
    }

    #[test]
    fn test_directory_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let err = LocalSource::new()
            .acquire(temp.path().to_str().unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::SourceError(ref m) if m.contains("Not a file")));
    }
}
