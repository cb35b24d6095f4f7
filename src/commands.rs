// src/commands.rs
//! Command handlers for the deb2arch CLI

use anyhow::{bail, Context, Result};
use deb2arch::config::{load_user_mappings, Config};
use deb2arch::converter::{Converter, ConverterOptions};
use deb2arch::deb::{ControlMetadata, DebExtractor, DependencyList};
use deb2arch::deps::{DependencyResolver, MappingStatus, PkgfileLookup};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// Settings of `deb2arch convert`
pub struct ConvertArgs {
    pub target: String,
    pub output: Option<PathBuf>,
    pub install: bool,
    pub quiet: bool,
    pub mappings: Option<PathBuf>,
    pub include_scripts: bool,
    pub release: Option<u32>,
    pub no_pkgfile: bool,
}

pub fn cmd_convert(config: &Config, args: ConvertArgs) -> Result<()> {
    let mut config = config.clone();
    if let Some(path) = args.mappings {
        config.custom_mappings_file = Some(path);
    }
    if let Some(output) = args.output {
        config.output_dir = Some(output);
    }
    if let Some(release) = args.release {
        config.release = release;
    }
    config.include_scripts |= args.include_scripts;
    config.quiet |= args.quiet;
    if args.no_pkgfile {
        config.use_pkgfile = false;
    }

    let options = ConverterOptions::from_config(&config).context("Invalid configuration")?;
    let converter = Converter::new(options)?;

    info!("Converting {}", args.target);
    let outcome = converter.convert(&args.target);

    if !config.quiet {
        for warning in &outcome.warnings {
            eprintln!("warning: {}", warning);
        }
    }

    if !outcome.success {
        for error in &outcome.errors {
            eprintln!("error: {}", error);
        }
        bail!("Conversion of {} failed", args.target);
    }

    let Some(package) = outcome.package_path else {
        bail!("Conversion reported success without a package");
    };

    if config.quiet {
        println!("{}", package.display());
    } else {
        println!("Created {}", package.display());
        if !outcome.unmapped.is_empty() {
            println!(
                "Unmapped dependencies (not declared): {}",
                outcome.unmapped.join(", ")
            );
        }
    }

    if args.install {
        install_package(&package)?;
    }

    Ok(())
}

/// Hand the package to pacman
fn install_package(package: &Path) -> Result<()> {
    info!("Installing {} with pacman", package.display());

    let status = Command::new("sudo")
        .arg("pacman")
        .arg("-U")
        .arg(package)
        .status()
        .context("Failed to run pacman. Is pacman installed?")?;

    if !status.success() {
        bail!("pacman -U {} failed ({})", package.display(), status);
    }
    Ok(())
}

pub fn cmd_inspect(deb: &Path) -> Result<()> {
    let mut extractor = DebExtractor::new()?;
    let package = extractor
        .extract(deb)
        .with_context(|| format!("Failed to read {}", deb.display()))?;
    print_control(&package.control);

    if !package.conffiles.is_empty() {
        println!("Conffiles:");
        for file in &package.conffiles {
            println!("  {}", file);
        }
    }

    let scripts: Vec<&str> = [
        ("preinst", &package.scripts.preinst),
        ("postinst", &package.scripts.postinst),
        ("prerm", &package.scripts.prerm),
        ("postrm", &package.scripts.postrm),
    ]
    .into_iter()
    .filter(|(_, body)| body.is_some())
    .map(|(name, _)| name)
    .collect();
    if !scripts.is_empty() {
        println!("Maintainer scripts: {}", scripts.join(", "));
    }

    extractor.cleanup()?;
    Ok(())
}

fn print_control(control: &ControlMetadata) {
    println!("Package:      {}", control.package);
    println!("Version:      {}", control.version);
    println!(
        "Architecture: {} (arch: {})",
        control.architecture,
        control.architecture.to_arch()
    );
    if let Some(maintainer) = &control.maintainer {
        println!("Maintainer:   {}", maintainer);
    }
    if let Some(size) = control.installed_size {
        println!("Installed:    {} KiB", size);
    }
    if let Some(section) = &control.section {
        println!("Section:      {}", section);
    }
    if let Some(homepage) = &control.homepage {
        println!("Homepage:     {}", homepage);
    }
    println!("Description:  {}", control.synopsis());

    let fields: [(&str, &DependencyList); 8] = [
        ("Depends", &control.depends),
        ("Pre-Depends", &control.pre_depends),
        ("Recommends", &control.recommends),
        ("Suggests", &control.suggests),
        ("Conflicts", &control.conflicts),
        ("Breaks", &control.breaks),
        ("Provides", &control.provides),
        ("Replaces", &control.replaces),
    ];
    for (label, list) in fields {
        if !list.is_empty() {
            println!("{:<13} {}", format!("{}:", label), list.names().join(", "));
        }
    }
}

pub fn cmd_resolve(config: &Config, deps: &[String], mappings: Option<&Path>) -> Result<()> {
    let user = match mappings {
        Some(path) => load_user_mappings(Some(path))?,
        None => config.user_mappings()?,
    };

    let mut resolver = DependencyResolver::default().with_user_overrides(user);
    if config.use_pkgfile {
        resolver = resolver.with_lookup(Box::new(PkgfileLookup::new()));
    }

    for dep in deps {
        let mapping = resolver.resolve(dep);
        match mapping.status() {
            MappingStatus::Virtual => {
                let alternatives = resolver
                    .virtual_alternatives(dep)
                    .map(|a| a.join(" | "))
                    .unwrap_or_default();
                println!("{}  [alternatives: {}]", mapping, alternatives);
            }
            _ => println!("{}", mapping),
        }
    }

    Ok(())
}
