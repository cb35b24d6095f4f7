// src/deb/extractor.rs

//! `.deb` extraction
//!
//! The container is read twice: a first pass lists the `ar` members so the
//! control and data tarballs can be chosen by a fixed priority, a second pass
//! streams the chosen members through their decompressor into the workspace.
//! Nothing is buffered whole in memory.
//!
//! Tar entries are untrusted. Every entry goes through [`check_entry`]:
//! absolute paths, `..` components, hard links, device nodes, FIFOs and
//! symlinks leading outside the destination are refused and abort the
//! extraction. Entries are also checked against the tree unpacked so far, so
//! a chain of symlinks cannot redirect a later entry.

use super::control::parse_control;
use super::{ExtractedPackage, MaintainerScripts};
use crate::compression::{create_decoder, CompressionFormat};
use crate::error::{Error, Result};
use crate::filesystem::path::{link_target_within_root, sanitize_archive_path};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tar::EntryType;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// `ar` global header
const AR_MAGIC: &[u8; 8] = b"!<arch>\n";

/// Member name stems of the two tarballs
const CONTROL_STEM: &str = "control.tar";
const DATA_STEM: &str = "data.tar";

/// Candidate member names for a tarball stem, in probe order
///
/// The data tarball additionally accepts the legacy `.lzma` suffix.
pub fn member_candidates(stem: &str) -> Vec<(String, CompressionFormat)> {
    let order: &[CompressionFormat] = if stem == DATA_STEM {
        &CompressionFormat::DATA_PROBE_ORDER
    } else {
        &CompressionFormat::PROBE_ORDER
    };
    order
        .iter()
        .map(|format| (format!("{}{}", stem, format.extension()), *format))
        .collect()
}

/// Pick the first candidate present among `members`
fn select_member(members: &[String], stem: &str) -> Option<(String, CompressionFormat)> {
    member_candidates(stem)
        .into_iter()
        .find(|(name, _)| members.iter().any(|m| m == name))
}

/// Extracts `.deb` packages into a private temporary workspace
///
/// The workspace is owned by the extractor. [`DebExtractor::cleanup`] removes
/// it and may be called any number of times; dropping the extractor cleans up
/// as well, so the workspace is released on every exit path.
#[derive(Debug)]
pub struct DebExtractor {
    workspace: Option<TempDir>,
    work_dir: PathBuf,
}

impl DebExtractor {
    /// Create an extractor with a fresh workspace under the system temp dir
    pub fn new() -> Result<Self> {
        let workspace = tempfile::Builder::new()
            .prefix("deb2arch_")
            .tempdir()
            .map_err(|e| Error::IoError(format!("Failed to create workspace: {}", e)))?;
        Ok(Self::with_workspace(workspace))
    }

    /// Create an extractor whose workspace lives below `parent`
    pub fn new_in(parent: &Path) -> Result<Self> {
        let workspace = tempfile::Builder::new()
            .prefix("deb2arch_")
            .tempdir_in(parent)
            .map_err(|e| {
                Error::IoError(format!(
                    "Failed to create workspace in {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        Ok(Self::with_workspace(workspace))
    }

    fn with_workspace(workspace: TempDir) -> Self {
        let work_dir = workspace.path().to_path_buf();
        debug!("Created extraction workspace {}", work_dir.display());
        Self {
            workspace: Some(workspace),
            work_dir,
        }
    }

    /// Workspace root
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// True while the workspace exists
    pub fn is_active(&self) -> bool {
        self.workspace.is_some()
    }

    /// Extract a `.deb` and parse its control record
    pub fn extract(&self, deb_path: &Path) -> Result<ExtractedPackage> {
        if self.workspace.is_none() {
            return Err(Error::ExtractionError(
                "Extractor workspace has already been released".to_string(),
            ));
        }

        if !deb_path.exists() {
            return Err(Error::ExtractionError(format!(
                "File not found: {}",
                deb_path.display()
            )));
        }

        info!("Extracting {}", deb_path.display());

        check_ar_magic(deb_path)?;
        let members = list_members(deb_path)?;
        debug!("Container members: {:?}", members);

        let (control_member, control_format) = select_member(&members, CONTROL_STEM)
            .ok_or_else(|| {
                Error::ExtractionError("Invalid .deb: missing control archive".to_string())
            })?;
        let (data_member, data_format) = select_member(&members, DATA_STEM)
            .ok_or_else(|| Error::ExtractionError("Invalid .deb: missing data archive".to_string()))?;

        let control_dir = self.work_dir.join("control");
        let data_dir = self.work_dir.join("data");
        fs::create_dir_all(&control_dir)?;
        fs::create_dir_all(&data_dir)?;

        let targets = [
            (control_member.as_str(), control_format, control_dir.as_path()),
            (data_member.as_str(), data_format, data_dir.as_path()),
        ];
        unpack_members(deb_path, &targets)?;

        let control_file = control_dir.join("control");
        if !control_file.is_file() {
            return Err(Error::ExtractionError(
                "No control file found in package".to_string(),
            ));
        }
        let control_text = fs::read_to_string(&control_file).map_err(|e| {
            Error::ExtractionError(format!("Failed to read control file: {}", e))
        })?;
        let control = parse_control(&control_text)?;

        let scripts = read_scripts(&control_dir);
        let conffiles = read_conffiles(&control_dir);

        info!(
            "Extracted {} {} ({} conffiles, maintainer scripts: {})",
            control.package,
            control.version,
            conffiles.len(),
            if scripts.is_empty() { "none" } else { "present" }
        );

        Ok(ExtractedPackage {
            control,
            control_dir,
            data_dir,
            scripts,
            conffiles,
        })
    }

    /// Remove the workspace. Safe to call repeatedly.
    pub fn cleanup(&mut self) -> Result<()> {
        if let Some(workspace) = self.workspace.take() {
            debug!("Removing extraction workspace {}", self.work_dir.display());
            workspace.close().map_err(|e| {
                Error::IoError(format!(
                    "Failed to remove workspace {}: {}",
                    self.work_dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

impl Drop for DebExtractor {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            warn!("{}", e);
        }
    }
}

fn check_ar_magic(deb_path: &Path) -> Result<()> {
    let mut file = File::open(deb_path)
        .map_err(|e| Error::ExtractionError(format!("Failed to open {}: {}", deb_path.display(), e)))?;

    let mut magic = [0u8; 8];
    file.read_exact(&mut magic).map_err(|_| {
        Error::ExtractionError(format!("Not an ar archive (too short): {}", deb_path.display()))
    })?;

    if &magic != AR_MAGIC {
        return Err(Error::ExtractionError(format!(
            "Not an ar archive: {}",
            deb_path.display()
        )));
    }

    Ok(())
}

fn open_ar(deb_path: &Path) -> Result<ar::Archive<BufReader<File>>> {
    let file = File::open(deb_path)
        .map_err(|e| Error::ExtractionError(format!("Failed to open {}: {}", deb_path.display(), e)))?;
    Ok(ar::Archive::new(BufReader::new(file)))
}

/// GNU ar terminates member names with `/`
fn member_name(identifier: &[u8]) -> String {
    String::from_utf8_lossy(identifier)
        .trim_end_matches('/')
        .trim()
        .to_string()
}

fn list_members(deb_path: &Path) -> Result<Vec<String>> {
    let mut archive = open_ar(deb_path)?;
    let mut members = Vec::new();

    while let Some(entry) = archive.next_entry() {
        let entry = entry
            .map_err(|e| Error::ExtractionError(format!("Corrupt ar archive: {}", e)))?;
        let name = member_name(entry.header().identifier());

        if name == "debian-binary" {
            debug!("Found debian-binary member");
        }
        members.push(name);
    }

    Ok(members)
}

/// Stream each selected member through its decoder into its destination
fn unpack_members(deb_path: &Path, targets: &[(&str, CompressionFormat, &Path)]) -> Result<()> {
    let mut archive = open_ar(deb_path)?;
    let mut remaining = targets.len();

    while let Some(entry) = archive.next_entry() {
        let entry = entry
            .map_err(|e| Error::ExtractionError(format!("Corrupt ar archive: {}", e)))?;
        let name = member_name(entry.header().identifier());

        let Some((member, format, dest)) = targets.iter().find(|(m, _, _)| *m == name) else {
            continue;
        };

        debug!("Unpacking {} ({}) into {}", member, format, dest.display());
        let decoder = create_decoder(entry, *format).map_err(|e| {
            Error::ExtractionError(format!("Failed to decompress {}: {}", member, e))
        })?;
        let count = unpack_tar_filtered(decoder, dest, member)?;
        debug!("Unpacked {} entries from {}", count, member);

        remaining -= 1;
        if remaining == 0 {
            break;
        }
    }

    Ok(())
}

/// What to do with a tar entry after the security check
#[derive(Debug, PartialEq, Eq)]
enum EntryDecision {
    /// Unpack at this path, relative to the destination
    Unpack(PathBuf),
    /// The archive root itself (`./`)
    Skip,
}

/// Security filter for a single tar entry
fn check_entry(path: &Path, entry_type: EntryType, link_name: Option<&Path>) -> Result<EntryDecision> {
    let rel = match sanitize_archive_path(path) {
        Ok(Some(rel)) => rel,
        Ok(None) => return Ok(EntryDecision::Skip),
        Err(e) => {
            return Err(Error::ExtractionError(format!(
                "Unsafe path in archive: {}",
                e
            )));
        }
    };

    match entry_type {
        EntryType::Regular | EntryType::Directory => Ok(EntryDecision::Unpack(rel)),
        EntryType::Symlink => {
            let target = link_name.ok_or_else(|| {
                Error::ExtractionError(format!("Symlink without target: {}", rel.display()))
            })?;
            if link_target_within_root(&rel, target) {
                Ok(EntryDecision::Unpack(rel))
            } else {
                Err(Error::ExtractionError(format!(
                    "Symlink escapes package root: {} -> {}",
                    rel.display(),
                    target.display()
                )))
            }
        }
        other => Err(Error::ExtractionError(format!(
            "Refusing {:?} entry: {}",
            other,
            rel.display()
        ))),
    }
}

/// Check an entry against what is already unpacked under `dest`
///
/// [`check_entry`] only sees archive paths. Earlier symlinks change where a
/// later path really lands (`x -> .`, `x/y -> ..`, then `x/y/f`), so no entry
/// may be placed beneath an unpacked symlink, and a symlink target may only
/// pass through real directories.
fn check_against_tree(
    dest: &Path,
    rel: &Path,
    entry_type: EntryType,
    link_name: Option<&Path>,
) -> Result<()> {
    let parents: Vec<Component> = rel
        .parent()
        .map(|p| p.components().collect())
        .unwrap_or_default();

    let mut current = dest.to_path_buf();
    for component in &parents {
        current.push(component);
        if is_symlink(&current) {
            return Err(Error::ExtractionError(format!(
                "Entry {} lies beneath symlink {}",
                rel.display(),
                current.strip_prefix(dest).unwrap_or(current.as_path()).display()
            )));
        }
    }

    if entry_type == EntryType::Directory && is_symlink(&dest.join(rel)) {
        return Err(Error::ExtractionError(format!(
            "Directory {} would replace a symlink",
            rel.display()
        )));
    }

    let Some(target) = link_name.filter(|_| entry_type == EntryType::Symlink) else {
        return Ok(());
    };

    let escapes = || {
        Error::ExtractionError(format!(
            "Symlink escapes package root: {} -> {}",
            rel.display(),
            target.display()
        ))
    };

    let hops: Vec<Component> = target.components().collect();
    let mut resolved = parents;
    for (i, component) in hops.iter().enumerate() {
        match component {
            Component::Normal(_) => {
                resolved.push(*component);
                let is_last = i + 1 == hops.len();
                if !is_last && is_symlink(&dest.join(resolved.iter().collect::<PathBuf>())) {
                    return Err(escapes());
                }
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if resolved.pop().is_none() {
                    return Err(escapes());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(escapes()),
        }
    }

    Ok(())
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Untar `reader` into `dest`, applying [`check_entry`] to every entry
///
/// Ownership is never restored; permission bits are kept without
/// setuid/setgid/sticky.
fn unpack_tar_filtered<R: Read>(reader: R, dest: &Path, member: &str) -> Result<usize> {
    let corrupt = |e: std::io::Error| {
        Error::ExtractionError(format!("Corrupt tar archive in {}: {}", member, e))
    };

    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(false);
    archive.set_unpack_xattrs(false);

    let mut count = 0;

    for entry in archive.entries().map_err(corrupt)? {
        let mut entry = entry.map_err(corrupt)?;
        let path = entry.path().map_err(corrupt)?.into_owned();
        let link_name = entry.link_name().map_err(corrupt)?.map(|l| l.into_owned());
        let entry_type = entry.header().entry_type();

        let rel = match check_entry(&path, entry_type, link_name.as_deref())? {
            EntryDecision::Skip => continue,
            EntryDecision::Unpack(rel) => rel,
        };

        check_against_tree(dest, &rel, entry_type, link_name.as_deref())?;

        let target = dest.join(&rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        if entry_type != EntryType::Directory && is_symlink(&target) {
            fs::remove_file(&target)?;
        }

        entry.set_preserve_permissions(false);
        entry.set_preserve_mtime(true);
        entry.unpack(&target).map_err(|e| {
            Error::ExtractionError(format!("Failed to unpack {}: {}", rel.display(), e))
        })?;
        count += 1;
    }

    Ok(count)
}

/// Read the maintainer scripts present in the control directory
fn read_scripts(control_dir: &Path) -> MaintainerScripts {
    let mut scripts = MaintainerScripts::default();

    for name in MaintainerScripts::NAMES {
        let path = control_dir.join(name);
        if !path.is_file() {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(content) => {
                if let Some(slot) = scripts.slot(name) {
                    *slot = Some(content);
                }
            }
            Err(e) => warn!("Ignoring unreadable maintainer script {}: {}", name, e),
        }
    }

    scripts
}

/// Read `conffiles`: one absolute path per line, blank lines ignored
///
/// Newer dpkg versions allow a `remove-on-upgrade` flag before the path;
/// only the path is kept.
fn read_conffiles(control_dir: &Path) -> Vec<String> {
    let path = control_dir.join("conffiles");
    let Ok(content) = fs::read_to_string(&path) else {
        return Vec::new();
    };

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.split_whitespace().last())
        .map(str::to_string)
        .collect()
}
