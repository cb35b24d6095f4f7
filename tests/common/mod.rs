// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use deb2arch::arch::{ManifestTool, PackageAssembler, PkgInfo};
use deb2arch::compression::{compress, CompressionFormat};
use deb2arch::deps::{DependencyResolver, MappingTables};
use deb2arch::{Converter, ConverterOptions};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const HELLO_CONTROL: &str = "\
Package: hello
Version: 2.10-3
Architecture: amd64
Maintainer: Santiago Vila <sanvila@debian.org>
Installed-Size: 280
Depends: libc6 (>= 2.34)
Section: devel
Priority: optional
Homepage: https://www.gnu.org/software/hello/
Description: example package based on GNU hello
 The GNU hello program produces a familiar, friendly greeting.  It
 allows non-programmers to use a classic computer science tool which
 would otherwise be unavailable to them.
";

/// Builds `.deb` files in memory
pub struct DebBuilder {
    control: String,
    control_extra: Vec<(String, Vec<u8>, u32)>,
    data: Vec<(String, Vec<u8>, u32)>,
    symlinks: Vec<(String, String)>,
    format: CompressionFormat,
}

impl DebBuilder {
    pub fn new(control: &str) -> Self {
        Self {
            control: control.to_string(),
            control_extra: Vec::new(),
            data: Vec::new(),
            symlinks: Vec::new(),
            format: CompressionFormat::Gzip,
        }
    }

    pub fn hello() -> Self {
        Self::new(HELLO_CONTROL)
            .file("./usr/bin/hello", b"\x7fELF hello", 0o755)
            .file("./usr/share/doc/hello/copyright", b"GPL-3+", 0o644)
    }

    pub fn compression(mut self, format: CompressionFormat) -> Self {
        self.format = format;
        self
    }

    pub fn file(mut self, path: &str, content: &[u8], mode: u32) -> Self {
        self.data.push((path.to_string(), content.to_vec(), mode));
        self
    }

    pub fn symlink(mut self, path: &str, target: &str) -> Self {
        self.symlinks.push((path.to_string(), target.to_string()));
        self
    }

    pub fn control_file(mut self, name: &str, content: &str, mode: u32) -> Self {
        self.control_extra
            .push((name.to_string(), content.as_bytes().to_vec(), mode));
        self
    }

    fn tarball(entries: &[(String, Vec<u8>, u32)], symlinks: &[(String, String)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, content, mode) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(*mode);
            header.set_entry_type(tar::EntryType::Regular);
            builder
                .append_data(&mut header, path, content.as_slice())
                .unwrap();
        }
        for (path, target) in symlinks {
            let mut header = tar::Header::new_gnu();
            header.set_size(0);
            header.set_mode(0o777);
            header.set_entry_type(tar::EntryType::Symlink);
            builder.append_link(&mut header, path, target).unwrap();
        }
        builder.into_inner().unwrap()
    }

    pub fn build(self) -> Vec<u8> {
        let mut control_entries = vec![(
            "./control".to_string(),
            self.control.as_bytes().to_vec(),
            0o644,
        )];
        control_entries.extend(self.control_extra);

        let control = compress(&Self::tarball(&control_entries, &[]), self.format).unwrap();
        let data = compress(&Self::tarball(&self.data, &self.symlinks), self.format).unwrap();
        let suffix = self.format.extension();

        let mut builder = ar::Builder::new(Vec::new());
        let members: [(String, Vec<u8>); 3] = [
            ("debian-binary".to_string(), b"2.0\n".to_vec()),
            (format!("control.tar{}", suffix), control),
            (format!("data.tar{}", suffix), data),
        ];
        for (name, content) in members {
            let header = ar::Header::new(name.into_bytes(), content.len() as u64);
            builder.append(&header, content.as_slice()).unwrap();
        }
        builder.into_inner().unwrap()
    }

    pub fn write_to(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

/// Manifest tool that writes a stub manifest without bsdtar
pub struct StubManifest;

impl ManifestTool for StubManifest {
    fn name(&self) -> &str {
        "stub-mtree"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn write_manifest(
        &self,
        _root: &Path,
        entries: &[PathBuf],
        output: &Path,
    ) -> deb2arch::Result<()> {
        let mut text = String::from("#mtree\n");
        for entry in entries {
            text.push_str(&format!("./{}\n", entry.display()));
        }
        std::fs::write(output, text)?;
        Ok(())
    }
}

/// Converter writing into `output_dir`, independent of bsdtar and pkgfile
pub fn test_converter(output_dir: &Path, user_mappings: HashMap<String, String>) -> Converter {
    test_converter_with(ConverterOptions {
        output_dir: output_dir.to_path_buf(),
        user_mappings,
        build_date: Some(1_700_000_000),
        use_pkgfile: false,
        quiet: true,
        ..Default::default()
    })
}

pub fn test_converter_with(options: ConverterOptions) -> Converter {
    let resolver = DependencyResolver::new(MappingTables::default())
        .with_user_overrides(options.user_mappings.clone());
    let assembler = PackageAssembler::new(Box::new(StubManifest)).unwrap();
    Converter::with_parts(options, resolver, assembler)
}

/// Entry names and contents of a `.pkg.tar.zst`
pub fn read_package(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = File::open(path).unwrap();
    let decoder = zstd::stream::read::Decoder::new(file).unwrap();
    let mut archive = tar::Archive::new(decoder);
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().to_string();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            (name, content)
        })
        .collect()
}

/// Parsed `.PKGINFO` of a `.pkg.tar.zst`
pub fn read_pkginfo(path: &Path) -> PkgInfo {
    let entries = read_package(path);
    let (_, content) = entries
        .iter()
        .find(|(name, _)| name == ".PKGINFO")
        .expect("package has no .PKGINFO");
    PkgInfo::parse(&String::from_utf8_lossy(content)).unwrap()
}

pub fn tempdir() -> TempDir {
    tempfile::tempdir().unwrap()
}
