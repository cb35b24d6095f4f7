// src/arch/pkginfo.rs

//! `.PKGINFO` metadata record
//!
//! pacman reads package identity and relationships from a `key = value`
//! file at the top of the archive. Repeated keys (`depend`, `license`, ...)
//! carry list values, one entry per line.

use std::fmt::Write as _;

/// Packager identity written when none is configured
pub const DEFAULT_PACKAGER: &str = "deb2arch";

/// License written when the source package declares none
pub const DEFAULT_LICENSE: &str = "custom";

/// Metadata of the Arch package being produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgInfo {
    pub name: String,
    /// Upstream version, already normalized for Arch
    pub version: String,
    /// `pkgrel`
    pub release: u32,
    pub description: String,
    /// Arch architecture (`x86_64`, `any`, ...)
    pub arch: String,
    pub url: Option<String>,
    pub licenses: Vec<String>,
    pub packager: String,
    /// Installed size in bytes
    pub size: u64,
    /// Build time, seconds since the epoch
    pub builddate: i64,
    pub depends: Vec<String>,
    pub optdepends: Vec<String>,
    pub conflicts: Vec<String>,
    pub provides: Vec<String>,
    pub replaces: Vec<String>,
    /// Config files, relative to the package root
    pub backup: Vec<String>,
}

impl PkgInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            release: 1,
            description: String::new(),
            arch: arch.into(),
            url: None,
            licenses: vec![DEFAULT_LICENSE.to_string()],
            packager: DEFAULT_PACKAGER.to_string(),
            size: 0,
            builddate: 0,
            depends: Vec::new(),
            optdepends: Vec::new(),
            conflicts: Vec::new(),
            provides: Vec::new(),
            replaces: Vec::new(),
            backup: Vec::new(),
        }
    }

    /// `pkgver` value: `<version>-<release>`
    pub fn full_version(&self) -> String {
        format!("{}-{}", self.version, self.release)
    }

    /// Output file name, `{name}-{version}-{release}-{arch}.pkg.tar.zst`
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}.pkg.tar.zst",
            self.name,
            self.full_version(),
            self.arch
        )
    }

    /// Render the `.PKGINFO` text
    ///
    /// List values are emitted once each, in first-seen order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# Generated by deb2arch\n");

        let _ = writeln!(out, "pkgname = {}", self.name);
        let _ = writeln!(out, "pkgver = {}", self.full_version());
        let _ = writeln!(out, "pkgdesc = {}", single_line(&self.description));
        if let Some(url) = &self.url {
            let _ = writeln!(out, "url = {}", url);
        }
        let _ = writeln!(out, "builddate = {}", self.builddate);
        let _ = writeln!(out, "packager = {}", self.packager);
        let _ = writeln!(out, "size = {}", self.size);
        let _ = writeln!(out, "arch = {}", self.arch);

        let lists: [(&str, &Vec<String>); 7] = [
            ("license", &self.licenses),
            ("replaces", &self.replaces),
            ("conflict", &self.conflicts),
            ("provides", &self.provides),
            ("backup", &self.backup),
            ("depend", &self.depends),
            ("optdepend", &self.optdepends),
        ];
        for (key, values) in lists {
            for value in unique(values) {
                let _ = writeln!(out, "{} = {}", key, value);
            }
        }

        out
    }

    /// Parse `.PKGINFO` text back into a record
    ///
    /// Unknown keys are ignored. Returns `None` without `pkgname` or `pkgver`.
    pub fn parse(content: &str) -> Option<Self> {
        let mut name = None;
        let mut full_version = None;
        let mut info = PkgInfo::new("", "", "any");
        info.licenses.clear();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();

            match key.trim() {
                "pkgname" => name = Some(value),
                "pkgver" => full_version = Some(value),
                "pkgdesc" => info.description = value,
                "url" => info.url = Some(value),
                "builddate" => info.builddate = value.parse().unwrap_or(0),
                "packager" => info.packager = value,
                "size" => info.size = value.parse().unwrap_or(0),
                "arch" => info.arch = value,
                "license" => info.licenses.push(value),
                "depend" => info.depends.push(value),
                "optdepend" => info.optdepends.push(value),
                "conflict" => info.conflicts.push(value),
                "provides" => info.provides.push(value),
                "replaces" => info.replaces.push(value),
                "backup" => info.backup.push(value),
                _ => {}
            }
        }

        info.name = name?;
        let full_version = full_version?;
        match full_version.rsplit_once('-') {
            Some((version, release)) if release.parse::<u32>().is_ok() => {
                info.version = version.to_string();
                info.release = release.parse().unwrap_or(1);
            }
            _ => info.version = full_version,
        }

        Some(info)
    }
}

fn unique(values: &[String]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// `.PKGINFO` values cannot span lines
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
