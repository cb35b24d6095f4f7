// src/converter.rs

//! Conversion pipeline
//!
//! Drives one `.deb` through acquisition, extraction, dependency resolution
//! and assembly. Problems that do not prevent a usable package (unmapped
//! dependencies) become warnings; anything else stops the run and is reported
//! as the single error of the outcome. Temporary files are released on every
//! path out of [`Converter::convert`].

use crate::arch::{PackageAssembler, PkgInfo, DEFAULT_PACKAGER};
use crate::config::Config;
use crate::deb::{normalize_version, ControlMetadata, DebExtractor, DependencyList, ExtractedPackage};
use crate::deps::{DependencyMapping, DependencyResolver, MappingStatus, PkgfileLookup};
use crate::error::Result;
use crate::sources::{source_for, PackageSource};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Knobs for a [`Converter`]
#[derive(Debug, Clone)]
pub struct ConverterOptions {
    pub output_dir: PathBuf,
    /// Dependency overrides, consulted before every other tier
    pub user_mappings: HashMap<String, String>,
    /// Wrap Debian maintainer scripts into `.INSTALL`
    pub include_scripts: bool,
    pub packager: String,
    pub release: u32,
    /// Fixed build time; falls back to `SOURCE_DATE_EPOCH`, then the clock
    pub build_date: Option<i64>,
    pub use_pkgfile: bool,
    /// No progress output
    pub quiet: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            user_mappings: HashMap::new(),
            include_scripts: false,
            packager: DEFAULT_PACKAGER.to_string(),
            release: 1,
            build_date: None,
            use_pkgfile: true,
            quiet: false,
        }
    }
}

impl ConverterOptions {
    /// Options from a loaded configuration, including its user mappings
    pub fn from_config(config: &Config) -> Result<Self> {
        let output_dir = match &config.output_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        Ok(Self {
            output_dir,
            user_mappings: config.user_mappings()?,
            include_scripts: config.include_scripts,
            packager: config.packager.clone(),
            release: config.release,
            build_date: None,
            use_pkgfile: config.use_pkgfile,
            quiet: config.quiet,
        })
    }

    fn resolve_build_date(&self) -> i64 {
        if let Some(date) = self.build_date {
            return date;
        }
        if let Some(epoch) = std::env::var("SOURCE_DATE_EPOCH")
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
        {
            return epoch;
        }
        chrono::Utc::now().timestamp()
    }
}

/// Result of one conversion run
#[derive(Debug, Clone, Default)]
pub struct ConversionOutcome {
    pub success: bool,
    pub package_path: Option<PathBuf>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Hard dependencies nothing could map
    pub unmapped: Vec<String>,
    /// Every resolved relationship, hard dependencies first
    pub mappings: Vec<DependencyMapping>,
}

/// Resolved relationships of one package
#[derive(Debug, Default)]
struct ResolvedRelations {
    depends: Vec<String>,
    optdepends: Vec<String>,
    conflicts: Vec<String>,
    replaces: Vec<String>,
    mappings: Vec<DependencyMapping>,
    unmapped: Vec<String>,
}

/// Converts `.deb` packages to Arch packages
#[derive(Debug)]
pub struct Converter {
    options: ConverterOptions,
    resolver: DependencyResolver,
    assembler: PackageAssembler,
}

impl Converter {
    /// Converter with the built-in tables, `pkgfile` (if enabled) and `bsdtar`
    pub fn new(options: ConverterOptions) -> Result<Self> {
        let mut resolver =
            DependencyResolver::default().with_user_overrides(options.user_mappings.clone());
        if options.use_pkgfile {
            resolver = resolver.with_lookup(Box::new(PkgfileLookup::new()));
        }
        let assembler = PackageAssembler::with_bsdtar()?;
        Ok(Self::with_parts(options, resolver, assembler))
    }

    /// Converter from explicit parts
    pub fn with_parts(
        options: ConverterOptions,
        resolver: DependencyResolver,
        assembler: PackageAssembler,
    ) -> Self {
        Self {
            options,
            resolver,
            assembler,
        }
    }

    /// Convert a local path or URL
    pub fn convert(&self, target: &str) -> ConversionOutcome {
        match source_for(target, !self.options.quiet) {
            Ok(mut source) => self.convert_with_source(source.as_mut(), target),
            Err(e) => ConversionOutcome {
                errors: vec![e.to_string()],
                ..Default::default()
            },
        }
    }

    /// Convert `target` obtained through `source`
    ///
    /// The source is released before returning, whatever the result.
    pub fn convert_with_source(
        &self,
        source: &mut dyn PackageSource,
        target: &str,
    ) -> ConversionOutcome {
        let mut outcome = ConversionOutcome::default();

        match self.run(source, target, &mut outcome) {
            Ok(path) => {
                outcome.success = true;
                outcome.package_path = Some(path);
            }
            Err(e) => {
                if e.is_abort_category() {
                    warn!("Conversion of {} aborted: {}", target, e);
                } else {
                    warn!("Conversion of {} failed: {}", target, e);
                }
                outcome.errors.push(e.to_string());
            }
        }

        if let Err(e) = source.release() {
            warn!("{}", e);
            outcome.warnings.push(format!("Cleanup failed: {}", e));
        }

        outcome
    }

    fn run(
        &self,
        source: &mut dyn PackageSource,
        target: &str,
        outcome: &mut ConversionOutcome,
    ) -> Result<PathBuf> {
        let deb_path = source.acquire(target)?;

        let mut extractor = DebExtractor::new()?;
        let result = self.convert_extracted(&extractor, &deb_path, outcome);
        if let Err(e) = extractor.cleanup() {
            warn!("{}", e);
            outcome.warnings.push(format!("Cleanup failed: {}", e));
        }
        result
    }

    fn convert_extracted(
        &self,
        extractor: &DebExtractor,
        deb_path: &Path,
        outcome: &mut ConversionOutcome,
    ) -> Result<PathBuf> {
        let package = extractor.extract(deb_path)?;
        let control = &package.control;

        info!("Converting {} {}", control.package, control.version);

        let relations = self.resolve_relations(control);
        for name in &relations.unmapped {
            outcome.warnings.push(format!("Unmapped dependency: {}", name));
        }
        outcome.unmapped = relations.unmapped.clone();
        outcome.mappings = relations.mappings.clone();

        let info = self.build_pkginfo(&package, &relations);
        let scripts = self.options.include_scripts.then_some(&package.scripts);
        if !self.options.include_scripts && !package.scripts.is_empty() {
            debug!("Maintainer scripts present but not included");
        }

        self.assembler
            .build_package(&info, &package.data_dir, &self.options.output_dir, scripts)
    }

    fn resolve_relations(&self, control: &ControlMetadata) -> ResolvedRelations {
        let mut rel = ResolvedRelations::default();

        for dep in control.depends.iter().chain(control.pre_depends.iter()) {
            let mapping = self.resolver.resolve(&dep.declared);
            match (mapping.status(), mapping.target()) {
                (MappingStatus::Mapped | MappingStatus::Virtual, Some(target)) => {
                    push_unique(&mut rel.depends, target);
                }
                (MappingStatus::Unmapped, _) => push_unique(&mut rel.unmapped, &dep.declared),
                _ => {}
            }
            rel.mappings.push(mapping);
        }

        for dep in control.recommends.iter().chain(control.suggests.iter()) {
            let mapping = self.resolver.resolve(&dep.declared);
            if let Some(target) = mapping.target().filter(|_| mapping.is_resolved()) {
                if !rel.depends.iter().any(|d| d == target) {
                    push_unique(&mut rel.optdepends, target);
                }
            } else {
                debug!("Dropping optional dependency {}", dep.declared);
            }
            rel.mappings.push(mapping);
        }

        rel.conflicts = self.resolve_names(&[&control.conflicts, &control.breaks]);
        rel.replaces = self.resolve_names(&[&control.replaces]);

        // A package never depends on itself
        rel.depends.retain(|d| d != &control.package);
        rel.optdepends.retain(|d| d != &control.package);

        rel
    }

    /// Arch names for relationship fields other than dependencies
    ///
    /// Version-constrained clauses are left out: `Breaks: libc6 (<< 2.0)`
    /// must not turn into an unconditional conflict with glibc.
    fn resolve_names(&self, lists: &[&DependencyList]) -> Vec<String> {
        let mut names = Vec::new();
        for dep in lists.iter().flat_map(|l| l.iter()) {
            if has_version_constraint(&dep.declared) {
                debug!("Dropping versioned relation {}", dep.declared);
                continue;
            }
            let mapping = self.resolver.resolve(&dep.declared);
            if let Some(target) = mapping.target().filter(|_| mapping.is_resolved()) {
                push_unique(&mut names, target);
            }
        }
        names
    }

    fn build_pkginfo(&self, package: &ExtractedPackage, rel: &ResolvedRelations) -> PkgInfo {
        let control = &package.control;

        let mut info = PkgInfo::new(
            control.package.clone(),
            normalize_version(&control.version),
            control.architecture.to_arch(),
        );
        info.release = self.options.release;
        info.description = control.synopsis().to_string();
        info.url = control.homepage.clone();
        info.packager = self.options.packager.clone();
        info.builddate = self.options.resolve_build_date();
        info.depends = rel.depends.clone();
        info.optdepends = rel.optdepends.clone();
        info.conflicts = rel.conflicts.clone();
        info.replaces = rel.replaces.clone();
        info.provides = control.provides.names().into_iter().map(str::to_string).collect();
        info.backup = package
            .conffiles
            .iter()
            .map(|f| f.trim_start_matches('/').to_string())
            .filter(|f| !f.is_empty())
            .collect();
        info
    }
}

fn has_version_constraint(clause: &str) -> bool {
    clause.contains('(')
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
