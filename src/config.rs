// src/config.rs

//! Configuration
//!
//! Two optional TOML files live in the configuration directory
//! (`$XDG_CONFIG_HOME/deb2arch`, falling back to the platform config dir):
//!
//! - `config.toml`: conversion defaults
//! - `mappings.toml`: user dependency overrides in a `[mappings]` table
//!
//! ```toml
//! [mappings]
//! libfoo2 = "foo"
//! "python3-bar" = "python-bar"
//! ```
//!
//! A missing file means defaults. A file that exists but does not parse is
//! an error; it is never silently replaced by defaults.

use crate::arch::DEFAULT_PACKAGER;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "deb2arch";
const CONFIG_FILE: &str = "config.toml";
const MAPPINGS_FILE: &str = "mappings.toml";

/// Configuration directory, if one can be determined
pub fn config_dir() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME")
        .or_else(dirs::config_dir)
        .map(|d| d.join(APP_DIR))
}

/// Cache directory, if one can be determined
pub fn cache_dir() -> Option<PathBuf> {
    xdg_dir("XDG_CACHE_HOME")
        .or_else(dirs::cache_dir)
        .map(|d| d.join(APP_DIR))
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE))
}

pub fn mappings_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(MAPPINGS_FILE))
}

fn xdg_dir(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Contents of `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where packages are written; the working directory when unset
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Wrap Debian maintainer scripts into `.INSTALL`
    #[serde(default)]
    pub include_scripts: bool,

    #[serde(default = "default_packager")]
    pub packager: String,

    /// `pkgrel` of produced packages
    #[serde(default = "default_release")]
    pub release: u32,

    #[serde(default)]
    pub quiet: bool,

    /// Mapping file used instead of `mappings.toml` in the config directory
    #[serde(default)]
    pub custom_mappings_file: Option<PathBuf>,

    /// Consult `pkgfile` when the built-in tables have no answer
    #[serde(default = "default_true")]
    pub use_pkgfile: bool,
}

fn default_packager() -> String {
    DEFAULT_PACKAGER.to_string()
}

fn default_release() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            include_scripts: false,
            packager: default_packager(),
            release: default_release(),
            quiet: false,
            custom_mappings_file: None,
            use_pkgfile: true,
        }
    }
}

impl Config {
    /// Load `config.toml` from `path`, or from the config directory
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.release == 0 {
            return Err(Error::ConfigError("release must be at least 1".to_string()));
        }
        if self.packager.trim().is_empty() {
            return Err(Error::ConfigError("packager must not be empty".to_string()));
        }
        Ok(())
    }

    /// User mappings from `custom_mappings_file`, or `mappings.toml`
    ///
    /// An explicitly configured file must exist.
    pub fn user_mappings(&self) -> Result<HashMap<String, String>> {
        match &self.custom_mappings_file {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::ConfigError(format!(
                        "Mappings file not found: {}",
                        path.display()
                    )));
                }
                load_user_mappings(Some(path))
            }
            None => load_user_mappings(None),
        }
    }
}

/// `mappings.toml` layout
#[derive(Debug, Default, Deserialize)]
struct MappingsFile {
    #[serde(default)]
    mappings: HashMap<String, String>,
}

/// Load user dependency overrides; a missing file yields an empty table
pub fn load_user_mappings(path: Option<&Path>) -> Result<HashMap<String, String>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match mappings_path() {
            Some(p) => p,
            None => return Ok(HashMap::new()),
        },
    };

    if !path.exists() {
        return Ok(HashMap::new());
    }

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
    let file: MappingsFile = toml::from_str(&content)
        .map_err(|e| Error::ConfigError(format!("Invalid mappings in {}: {}", path.display(), e)))?;

    debug!("Loaded {} user mappings from {}", file.mappings.len(), path.display());
    Ok(file.mappings)
}
