// src/arch/assembler.rs

//! Arch package assembly
//!
//! Turns an extracted package root into a `.pkg.tar.zst`:
//! - layout normalization (merged `/usr`)
//! - `.PKGINFO`, optional `.INSTALL`, gzipped `.MTREE`
//! - a zstd-compressed tar with metadata entries first

use super::layout::{clamp_mtimes, normalize_layout};
use super::mtree::{BsdtarManifest, ManifestTool};
use super::pkginfo::PkgInfo;
use crate::compression::{compress, CompressionFormat, ZSTD_LEVEL};
use crate::deb::MaintainerScripts;
use crate::error::{Error, Result};
use crate::filesystem::tree_size;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tar::{EntryType, Header, HeaderMode};
use tracing::{debug, info};
use walkdir::WalkDir;

pub const PKGINFO_FILE: &str = ".PKGINFO";
pub const INSTALL_FILE: &str = ".INSTALL";
pub const MTREE_FILE: &str = ".MTREE";

/// Metadata files at the top of the archive, in archive order
const METADATA_FILES: [&str; 3] = [PKGINFO_FILE, INSTALL_FILE, MTREE_FILE];

/// Builds Arch packages from a prepared package root
pub struct PackageAssembler {
    manifest_tool: Box<dyn ManifestTool + Send + Sync>,
}

impl std::fmt::Debug for PackageAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageAssembler")
            .field("manifest_tool", &self.manifest_tool.name())
            .finish()
    }
}

impl PackageAssembler {
    /// Create an assembler, failing early if the manifest tool is missing
    pub fn new(manifest_tool: Box<dyn ManifestTool + Send + Sync>) -> Result<Self> {
        if !manifest_tool.is_available() {
            return Err(Error::BuildError(format!(
                "{} is required but not found",
                manifest_tool.name()
            )));
        }
        Ok(Self { manifest_tool })
    }

    /// Assembler using `bsdtar` from `PATH`
    pub fn with_bsdtar() -> Result<Self> {
        Self::new(Box::new(BsdtarManifest::new()))
    }

    /// Move legacy top-level directories under `usr/`
    pub fn normalize_layout(&self, root: &Path) -> Result<()> {
        normalize_layout(root)
    }

    /// Write `.PKGINFO`, with `size` computed from the content tree
    pub fn generate_pkginfo(&self, info: &PkgInfo, root: &Path) -> Result<PathBuf> {
        let mut info = info.clone();
        info.size = content_size(root)?;

        let path = root.join(PKGINFO_FILE);
        fs::write(&path, info.render()).map_err(|e| {
            Error::BuildError(format!("Failed to write {}: {}", PKGINFO_FILE, e))
        })?;
        debug!("Wrote {} (size = {})", path.display(), info.size);
        Ok(path)
    }

    /// Write `.INSTALL` wrapping the Debian maintainer scripts
    ///
    /// Returns `None` when there are no scripts to wrap.
    pub fn generate_install_script(
        &self,
        scripts: &MaintainerScripts,
        root: &Path,
    ) -> Result<Option<PathBuf>> {
        let Some(script) = render_install_script(scripts) else {
            return Ok(None);
        };

        let path = root.join(INSTALL_FILE);
        fs::write(&path, script).map_err(|e| {
            Error::BuildError(format!("Failed to write {}: {}", INSTALL_FILE, e))
        })?;
        debug!("Wrote {}", path.display());
        Ok(Some(path))
    }

    /// Generate `.MTREE` with the manifest tool, then gzip it in place
    pub fn generate_manifest(&self, root: &Path) -> Result<PathBuf> {
        let path = root.join(MTREE_FILE);
        if fs::symlink_metadata(&path).is_ok() {
            fs::remove_file(&path)?;
        }

        let entries = top_level_entries(root)?;
        self.manifest_tool.write_manifest(root, &entries, &path)?;

        let plain = match fs::read(&path) {
            Ok(data) if !data.is_empty() => data,
            _ => {
                return Err(Error::BuildError(format!(
                    "{} produced no manifest",
                    self.manifest_tool.name()
                )));
            }
        };

        let gzipped = compress(&plain, CompressionFormat::Gzip)
            .map_err(|e| Error::BuildError(format!("Failed to compress {}: {}", MTREE_FILE, e)))?;
        fs::write(&path, gzipped)?;

        debug!("Wrote {} ({} bytes uncompressed)", path.display(), plain.len());
        Ok(path)
    }

    /// Write the final archive into `output_dir`
    ///
    /// Metadata files come first, then the content tree in sorted order.
    /// Headers carry `builddate` as mtime and root ownership, so the same
    /// input always gives the same bytes.
    pub fn assemble(&self, info: &PkgInfo, root: &Path, output_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(output_dir).map_err(|e| {
            Error::BuildError(format!(
                "Failed to create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })?;

        let output = output_dir.join(info.file_name());
        let partial = output_dir.join(format!("{}.part", info.file_name()));

        let result = write_archive(root, &partial, info.builddate);
        if let Err(e) = result {
            let _ = fs::remove_file(&partial);
            return Err(Error::BuildError(format!(
                "Failed to write {}: {}",
                output.display(),
                e
            )));
        }

        fs::rename(&partial, &output).map_err(|e| {
            Error::BuildError(format!("Failed to move package into place: {}", e))
        })?;

        info!("Created {}", output.display());
        Ok(output)
    }

    /// Full build: layout, metadata, install script, manifest, archive
    pub fn build_package(
        &self,
        info: &PkgInfo,
        root: &Path,
        output_dir: &Path,
        scripts: Option<&MaintainerScripts>,
    ) -> Result<PathBuf> {
        self.normalize_layout(root)?;
        self.generate_pkginfo(info, root)?;

        let install = root.join(INSTALL_FILE);
        match scripts {
            Some(scripts) => {
                if self.generate_install_script(scripts, root)?.is_none() && install.exists() {
                    fs::remove_file(&install)?;
                }
            }
            None if install.exists() => fs::remove_file(&install)?,
            None => {}
        }

        clamp_mtimes(root, info.builddate)?;
        self.generate_manifest(root)?;
        self.assemble(info, root, output_dir)
    }
}

/// Size of the package content, excluding metadata files
fn content_size(root: &Path) -> Result<u64> {
    let mut size = tree_size(root)?;
    for name in METADATA_FILES {
        if let Ok(meta) = fs::symlink_metadata(root.join(name))
            && meta.is_file()
        {
            size = size.saturating_sub(meta.len());
        }
    }
    Ok(size)
}

/// Top-level names under `root`, metadata first, `.MTREE` excluded
fn top_level_entries(root: &Path) -> Result<Vec<PathBuf>> {
    let mut metadata = Vec::new();
    let mut content = Vec::new();

    for entry in fs::read_dir(root)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if name == MTREE_FILE {
            continue;
        }
        if METADATA_FILES.contains(&name.as_str()) {
            metadata.push(PathBuf::from(name));
        } else {
            content.push(PathBuf::from(name));
        }
    }

    metadata.sort_by_key(|n| METADATA_FILES.iter().position(|m| n.as_os_str() == *m));
    content.sort();
    metadata.extend(content);
    Ok(metadata)
}

fn write_archive(root: &Path, output: &Path, builddate: i64) -> std::io::Result<()> {
    let file = BufWriter::new(File::create(output)?);
    let encoder = zstd::stream::write::Encoder::new(file, ZSTD_LEVEL)?;
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    let mtime = builddate.max(0) as u64;

    for name in METADATA_FILES {
        let path = root.join(name);
        if path.is_file() {
            append_entry(&mut builder, &path, Path::new(name), mtime)?;
        }
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(std::io::Error::other)?;

        if entry.depth() == 1 && METADATA_FILES.iter().any(|m| rel.as_os_str() == *m) {
            continue;
        }

        append_entry(&mut builder, entry.path(), rel, mtime)?;
    }

    let encoder = builder.into_inner()?;
    let mut file = encoder.finish()?;
    file.flush()?;
    Ok(())
}

fn append_entry<W: Write>(
    builder: &mut tar::Builder<W>,
    path: &Path,
    rel: &Path,
    mtime: u64,
) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path)?;

    let mut header = Header::new_gnu();
    header.set_metadata_in_mode(&meta, HeaderMode::Deterministic);
    header.set_mode(meta.permissions().mode() & 0o777);
    header.set_mtime(mtime);
    header.set_uid(0);
    header.set_gid(0);
    header.set_username("root")?;
    header.set_groupname("root")?;

    let file_type = meta.file_type();
    if file_type.is_symlink() {
        let target = fs::read_link(path)?;
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        builder.append_link(&mut header, rel, target)
    } else if file_type.is_dir() {
        header.set_entry_type(EntryType::Directory);
        header.set_size(0);
        builder.append_data(&mut header, rel, std::io::empty())
    } else if file_type.is_file() {
        builder.append_data(&mut header, rel, File::open(path)?)
    } else {
        Err(std::io::Error::other(format!(
            "unsupported file type: {}",
            rel.display()
        )))
    }
}

fn push_function(script: &mut String, function: &str, body: &str, args: &str, marker: &str) {
    script.push_str(&format!("{}() {{\n", function));
    script.push_str(&format!("    sh -s -- {} <<'{}'\n", args, marker));
    script.push_str(body);
    if !body.ends_with('\n') {
        script.push('\n');
    }
    script.push_str(marker);
    script.push_str("\n}\n\n");
}

/// Wrap Debian maintainer scripts into Arch install hooks
///
/// Each Debian script runs unchanged in a child shell with the arguments
/// dpkg would pass it. pacman calls `pre_upgrade`/`post_upgrade` with the
/// new version first and the old one second.
pub fn render_install_script(scripts: &MaintainerScripts) -> Option<String> {
    if scripts.is_empty() {
        return None;
    }

    let mut script = String::from("# Generated by deb2arch from Debian maintainer scripts\n\n");

    if let Some(body) = &scripts.preinst {
        push_function(&mut script, "pre_install", body, "install", "DEB2ARCH_PREINST");
        push_function(&mut script, "pre_upgrade", body, "upgrade \"$2\"", "DEB2ARCH_PREINST");
    }

    if let Some(body) = &scripts.postinst {
        push_function(&mut script, "post_install", body, "configure", "DEB2ARCH_POSTINST");
        push_function(&mut script, "post_upgrade", body, "configure \"$2\"", "DEB2ARCH_POSTINST");
    }

    if let Some(body) = &scripts.prerm {
        push_function(&mut script, "pre_remove", body, "remove", "DEB2ARCH_PRERM");
    }

    if let Some(body) = &scripts.postrm {
        push_function(&mut script, "post_remove", body, "remove", "DEB2ARCH_POSTRM");
    }

    Some(script)
}
