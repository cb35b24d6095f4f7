// tests/conversion.rs
//! End-to-end conversion tests
//!
//! Each test builds a real `.deb` in memory, converts it and reads the
//! resulting `.pkg.tar.zst` back.

mod common;

use common::{read_package, read_pkginfo, test_converter, test_converter_with, tempdir, DebBuilder};
use deb2arch::compression::CompressionFormat;
use deb2arch::deps::{MappingSource, MappingStatus};
use deb2arch::ConverterOptions;
use std::collections::HashMap;

#[test]
fn test_convert_hello() {
    let input = tempdir();
    let output = tempdir();
    let deb = DebBuilder::hello().write_to(input.path(), "hello_2.10-3_amd64.deb");

    let converter = test_converter(output.path(), HashMap::new());
    let outcome = converter.convert(deb.to_str().unwrap());

    assert!(outcome.success, "errors: {:?}", outcome.errors);
    assert!(outcome.errors.is_empty());
    assert!(outcome.warnings.is_empty());
    assert!(outcome.unmapped.is_empty());

    let package = outcome.package_path.unwrap();
    assert_eq!(
        package.file_name().unwrap().to_string_lossy(),
        "hello-2.10_3-1-x86_64.pkg.tar.zst"
    );

    let info = read_pkginfo(&package);
    assert_eq!(info.name, "hello");
    assert_eq!(info.full_version(), "2.10_3-1");
    assert_eq!(info.arch, "x86_64");
    assert_eq!(info.depends, vec!["glibc"]);
    assert_eq!(info.description, "example package based on GNU hello");
    assert_eq!(info.url.as_deref(), Some("https://www.gnu.org/software/hello/"));
    assert_eq!(info.builddate, 1_700_000_000);

    let names: Vec<String> = read_package(&package).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names[0], ".PKGINFO");
    assert_eq!(names[1], ".MTREE");
    assert!(names.contains(&"usr/bin/hello".to_string()));

    let pkginfo_text = String::from_utf8(read_package(&package).remove(0).1).unwrap();
    assert!(pkginfo_text.contains("pkgver = 2.10_3-1\n"));
    assert!(pkginfo_text.contains("depend = glibc\n"));
}

#[test]
fn test_mappings_recorded() {
    let input = tempdir();
    let output = tempdir();
    let deb = DebBuilder::hello().write_to(input.path(), "hello.deb");

    let outcome = test_converter(output.path(), HashMap::new()).convert(deb.to_str().unwrap());

    assert_eq!(outcome.mappings.len(), 1);
    let mapping = &outcome.mappings[0];
    assert_eq!(mapping.original(), "libc6 (>= 2.34)");
    assert_eq!(mapping.target(), Some("glibc"));
    assert_eq!(mapping.source(), MappingSource::Builtin);
}

#[test]
fn test_unmapped_dependency_is_warning() {
    let control = "\
Package: gadget
Version: 0.3-1
Architecture: all
Depends: libc6, totally-unknown-pkg-9000 (>= 2), python3-requests
Description: gadget
";
    let input = tempdir();
    let output = tempdir();
    let deb = DebBuilder::new(control)
        .file("usr/share/gadget/gadget.py", b"print('hi')\n", 0o644)
        .write_to(input.path(), "gadget.deb");

    let outcome = test_converter(output.path(), HashMap::new()).convert(deb.to_str().unwrap());

    assert!(outcome.success);
    assert_eq!(outcome.unmapped, vec!["totally-unknown-pkg-9000 (>= 2)"]);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("totally-unknown-pkg-9000"));

    let statuses: Vec<MappingStatus> = outcome.mappings.iter().map(|m| m.status()).collect();
    assert_eq!(
        statuses,
        vec![MappingStatus::Mapped, MappingStatus::Unmapped, MappingStatus::Mapped]
    );

    let package = outcome.package_path.unwrap();
    assert!(package.to_string_lossy().ends_with("gadget-0.3_1-1-any.pkg.tar.zst"));
    let info = read_pkginfo(&package);
    assert_eq!(info.depends, vec!["glibc", "python-requests"]);
}

#[test]
fn test_user_mappings_override() {
    let input = tempdir();
    let output = tempdir();
    let deb = DebBuilder::hello().write_to(input.path(), "hello.deb");

    let mappings = HashMap::from([("libc6".to_string(), "musl".to_string())]);
    let outcome = test_converter(output.path(), mappings).convert(deb.to_str().unwrap());

    let info = read_pkginfo(&outcome.package_path.unwrap());
    assert_eq!(info.depends, vec!["musl"]);
    assert_eq!(outcome.mappings[0].source(), MappingSource::User);
}

#[test]
fn test_layout_normalized_in_package() {
    let input = tempdir();
    let output = tempdir();
    let deb = DebBuilder::new(common::HELLO_CONTROL)
        .file("./bin/hello", b"bin", 0o755)
        .file("./sbin/hello-admin", b"sbin", 0o755)
        .file("./lib/x86_64-linux-gnu/libhello.so.1", b"lib", 0o644)
        .symlink("./lib/x86_64-linux-gnu/libhello.so", "libhello.so.1")
        .write_to(input.path(), "hello.deb");

    let outcome = test_converter(output.path(), HashMap::new()).convert(deb.to_str().unwrap());
    assert!(outcome.success, "errors: {:?}", outcome.errors);

    let names: Vec<String> = read_package(&outcome.package_path.unwrap())
        .into_iter()
        .map(|(n, _)| n)
        .collect();
    assert!(names.contains(&"usr/bin/hello".to_string()));
    assert!(names.contains(&"usr/bin/hello-admin".to_string()));
    assert!(names.contains(&"usr/lib/x86_64-linux-gnu/libhello.so.1".to_string()));
    assert!(names.contains(&"usr/lib/x86_64-linux-gnu/libhello.so".to_string()));
    assert!(!names.iter().any(|n| n.starts_with("bin") || n.starts_with("sbin") || n.starts_with("lib")));
}

#[test]
fn test_scripts_and_conffiles() {
    let input = tempdir();
    let output = tempdir();
    let deb = DebBuilder::hello()
        .file("./etc/hello.conf", b"greeting=hi\n", 0o644)
        .control_file("./conffiles", "/etc/hello.conf\n", 0o644)
        .control_file("./postinst", "#!/bin/sh\nset -e\necho configured\n", 0o755)
        .write_to(input.path(), "hello.deb");

    let converter = test_converter_with(ConverterOptions {
        output_dir: output.path().to_path_buf(),
        include_scripts: true,
        build_date: Some(1),
        use_pkgfile: false,
        quiet: true,
        ..Default::default()
    });
    let outcome = converter.convert(deb.to_str().unwrap());
    assert!(outcome.success, "errors: {:?}", outcome.errors);

    let package = outcome.package_path.unwrap();
    let entries = read_package(&package);
    assert_eq!(entries[1].0, ".INSTALL");
    let install = String::from_utf8(entries[1].1.clone()).unwrap();
    assert!(install.contains("post_install()"));
    assert!(install.contains("echo configured"));

    let info = read_pkginfo(&package);
    assert_eq!(info.backup, vec!["etc/hello.conf"]);
}

#[test]
fn test_scripts_left_out_by_default() {
    let input = tempdir();
    let output = tempdir();
    let deb = DebBuilder::hello()
        .control_file("./postinst", "#!/bin/sh\necho configured\n", 0o755)
        .write_to(input.path(), "hello.deb");

    let outcome = test_converter(output.path(), HashMap::new()).convert(deb.to_str().unwrap());
    let names: Vec<String> = read_package(&outcome.package_path.unwrap())
        .into_iter()
        .map(|(n, _)| n)
        .collect();
    assert!(!names.contains(&".INSTALL".to_string()));
}

#[test]
fn test_every_compression_format() {
    for format in [
        CompressionFormat::Gzip,
        CompressionFormat::Xz,
        CompressionFormat::Zstd,
        CompressionFormat::Bzip2,
        CompressionFormat::None,
    ] {
        let input = tempdir();
        let output = tempdir();
        let deb = DebBuilder::hello()
            .compression(format)
            .write_to(input.path(), "hello.deb");

        let outcome = test_converter(output.path(), HashMap::new()).convert(deb.to_str().unwrap());
        assert!(outcome.success, "{format}: {:?}", outcome.errors);
    }
}

#[test]
fn test_invalid_container_fails_cleanly() {
    let input = tempdir();
    let output = tempdir();
    let bogus = input.path().join("bogus.deb");
    std::fs::write(&bogus, b"this is not an ar archive").unwrap();

    let outcome = test_converter(output.path(), HashMap::new()).convert(bogus.to_str().unwrap());

    assert!(!outcome.success);
    assert!(outcome.package_path.is_none());
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Extraction error"));
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_package_field_fails() {
    let input = tempdir();
    let output = tempdir();
    let deb = DebBuilder::new("Version: 1.0\nArchitecture: all\n")
        .file("usr/share/x", b"x", 0o644)
        .write_to(input.path(), "broken.deb");

    let outcome = test_converter(output.path(), HashMap::new()).convert(deb.to_str().unwrap());
    assert!(!outcome.success);
    assert!(outcome.errors[0].starts_with("Parse error"));
}

#[test]
fn test_converters_share_nothing() {
    let input = tempdir();
    let deb = DebBuilder::hello().write_to(input.path(), "hello.deb");
    let target = deb.to_str().unwrap().to_string();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let target = target.clone();
            std::thread::spawn(move || {
                let output = tempdir();
                let outcome = test_converter(output.path(), HashMap::new()).convert(&target);
                let package = outcome.package_path.unwrap();
                std::fs::read(package).unwrap()
            })
        })
        .collect();

    let packages: Vec<Vec<u8>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(packages[0], packages[1]);
}
