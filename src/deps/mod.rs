// src/deps/mod.rs

//! Debian → Arch dependency name resolution
//!
//! A dependency token is resolved through ordered tiers; the first tier with
//! an answer wins:
//!
//! 1. User overrides
//! 2. Built-in equivalences (including the skip list)
//! 3. Virtual packages, first alternative
//! 4. External file-ownership lookup (`pkgfile`), when attached and available
//! 5. Name heuristics
//!
//! Resolution never fails. A token nothing matches comes back
//! [`MappingStatus::Unmapped`] and the caller decides what to do with it.

pub mod mappings;
pub mod pkgfile;

pub use pkgfile::{FileOwnerLookup, PkgfileLookup};

use crate::deb::control::clean_dependency_token;

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// `lib<name><digits>`: soname-versioned library package
static VERSIONED_LIB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(lib.+?)\d+$").unwrap());

/// Outcome of resolving one token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingStatus {
    Mapped,
    /// Resolved through the virtual-package table
    Virtual,
    Unmapped,
    /// Debian-only tooling, deliberately dropped
    Skipped,
}

impl MappingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mapped => "mapped",
            Self::Virtual => "virtual",
            Self::Unmapped => "unmapped",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tier produced a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingSource {
    User,
    Builtin,
    VirtualTable,
    ExternalLookup,
    Fuzzy,
    None,
}

impl MappingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Builtin => "builtin",
            Self::VirtualTable => "virtual-table",
            Self::ExternalLookup => "external-lookup",
            Self::Fuzzy => "fuzzy",
            Self::None => "none",
        }
    }
}

impl fmt::Display for MappingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving a single Debian dependency token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyMapping {
    original: String,
    target: Option<String>,
    status: MappingStatus,
    source: MappingSource,
}

impl DependencyMapping {
    fn found(original: &str, target: &str, status: MappingStatus, source: MappingSource) -> Self {
        Self {
            original: original.to_string(),
            target: Some(target.to_string()),
            status,
            source,
        }
    }

    fn without_target(original: &str, status: MappingStatus, source: MappingSource) -> Self {
        Self {
            original: original.to_string(),
            target: None,
            status,
            source,
        }
    }

    /// The Debian token as given
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Arch package name, absent for unmapped and skipped tokens
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn status(&self) -> MappingStatus {
        self.status
    }

    pub fn source(&self) -> MappingSource {
        self.source
    }

    /// True when the mapping yields an Arch dependency to declare
    pub fn is_resolved(&self) -> bool {
        matches!(self.status, MappingStatus::Mapped | MappingStatus::Virtual)
    }
}

impl fmt::Display for DependencyMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(
                f,
                "{} -> {} ({}, {})",
                self.original, target, self.status, self.source
            ),
            None => write!(f, "{} ({})", self.original, self.status),
        }
    }
}

/// Built-in resolution data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTables {
    names: HashMap<String, String>,
    virtuals: HashMap<String, Vec<String>>,
    skipped: HashSet<String>,
}

impl Default for MappingTables {
    /// The curated tables from [`mappings`]
    fn default() -> Self {
        Self {
            names: mappings::NAME_MAPPINGS
                .iter()
                .map(|(deb, arch)| (deb.to_string(), arch.to_string()))
                .collect(),
            virtuals: mappings::VIRTUAL_MAPPINGS
                .iter()
                .map(|(name, alts)| {
                    (name.to_string(), alts.iter().map(|a| a.to_string()).collect())
                })
                .collect(),
            skipped: mappings::SKIPPED_PACKAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl MappingTables {
    /// Tables with no entries at all
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
            virtuals: HashMap::new(),
            skipped: HashSet::new(),
        }
    }

    pub fn with_name(mut self, deb: impl Into<String>, arch: impl Into<String>) -> Self {
        self.names.insert(deb.into(), arch.into());
        self
    }

    /// Add a virtual package; alternatives are listed in preference order
    pub fn with_virtual<I, S>(mut self, name: impl Into<String>, alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.virtuals
            .insert(name.into(), alternatives.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_skipped(mut self, name: impl Into<String>) -> Self {
        self.skipped.insert(name.into());
        self
    }
}

/// Resolves Debian dependency tokens to Arch package names
pub struct DependencyResolver {
    user: HashMap<String, String>,
    tables: MappingTables,
    lookup: Option<Box<dyn FileOwnerLookup + Send + Sync>>,
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new(MappingTables::default())
    }
}

impl fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("user", &self.user)
            .field("builtin_names", &self.tables.names.len())
            .field("lookup", &self.lookup.is_some())
            .finish()
    }
}

impl DependencyResolver {
    pub fn new(tables: MappingTables) -> Self {
        Self {
            user: HashMap::new(),
            tables,
            lookup: None,
        }
    }

    /// Install user overrides; they take precedence over every other tier
    pub fn with_user_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.user = overrides;
        self
    }

    /// Attach an external lookup. An unavailable lookup is not attached.
    pub fn with_lookup(mut self, lookup: Box<dyn FileOwnerLookup + Send + Sync>) -> Self {
        if lookup.is_available() {
            self.lookup = Some(lookup);
        } else {
            debug!("File-ownership lookup unavailable, skipping that tier");
        }
        self
    }

    pub fn has_lookup(&self) -> bool {
        self.lookup.is_some()
    }

    /// Resolve one dependency token
    ///
    /// The token may be a full relationship clause (`libc6 (>= 2.34)`,
    /// `python3:any`, `a | b`); it is reduced to a bare name for lookup and
    /// recorded verbatim as the mapping's original.
    pub fn resolve(&self, token: &str) -> DependencyMapping {
        let name = clean_dependency_token(token).unwrap_or_default();

        let mapping = self.resolve_name(&name, token.trim());
        debug!("Resolved {}", mapping);
        mapping
    }

    fn resolve_name(&self, name: &str, original: &str) -> DependencyMapping {
        if name.is_empty() {
            return DependencyMapping::without_target(
                original,
                MappingStatus::Unmapped,
                MappingSource::None,
            );
        }

        if let Some(target) = self.user.get(name) {
            return DependencyMapping::found(
                original,
                target,
                MappingStatus::Mapped,
                MappingSource::User,
            );
        }

        if self.tables.skipped.contains(name) {
            return DependencyMapping::without_target(
                original,
                MappingStatus::Skipped,
                MappingSource::Builtin,
            );
        }

        if let Some(target) = self.tables.names.get(name) {
            return DependencyMapping::found(
                original,
                target,
                MappingStatus::Mapped,
                MappingSource::Builtin,
            );
        }

        if let Some(first) = self
            .tables
            .virtuals
            .get(name)
            .and_then(|alternatives| alternatives.first())
        {
            return DependencyMapping::found(
                original,
                first,
                MappingStatus::Virtual,
                MappingSource::VirtualTable,
            );
        }

        if let Some(target) = self.lookup.as_ref().and_then(|l| l.lookup(name)) {
            return DependencyMapping::found(
                original,
                &target,
                MappingStatus::Mapped,
                MappingSource::ExternalLookup,
            );
        }

        if let Some(target) = fuzzy_match(name) {
            return DependencyMapping::found(
                original,
                &target,
                MappingStatus::Mapped,
                MappingSource::Fuzzy,
            );
        }

        DependencyMapping::without_target(original, MappingStatus::Unmapped, MappingSource::None)
    }

    /// Resolve every token, preserving order
    pub fn resolve_all<'a, I>(&self, tokens: I) -> Vec<DependencyMapping>
    where
        I: IntoIterator<Item = &'a str>,
    {
        tokens.into_iter().map(|t| self.resolve(t)).collect()
    }

    /// All Arch packages able to satisfy a Debian virtual package
    pub fn virtual_alternatives(&self, token: &str) -> Option<&[String]> {
        let name = clean_dependency_token(token)?;
        self.tables.virtuals.get(&name).map(Vec::as_slice)
    }
}

/// Naming-convention heuristics
///
/// The trailing-digit rule strips every trailing digit, so a library whose
/// project name ends in a digit (`libfoo2` from project `foo2`) comes out
/// wrong. Earlier tiers are expected to cover those.
pub fn fuzzy_match(name: &str) -> Option<String> {
    if let Some(rest) = name.strip_prefix("python3-") {
        if !rest.is_empty() {
            return Some(format!("python-{}", rest));
        }
    }

    if let Some(base) = name.strip_suffix("-dev") {
        if !base.is_empty() {
            return Some(base.to_string());
        }
    }

    VERSIONED_LIB
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeLookup {
        available: bool,
        answers: HashMap<String, String>,
    }

    impl FileOwnerLookup for FakeLookup {
        fn is_available(&self) -> bool {
            self.available
        }

        fn lookup(&self, name: &str) -> Option<String> {
            self.answers.get(name).cloned()
        }
    }

    fn fake(available: bool, pairs: &[(&str, &str)]) -> Box<FakeLookup> {
        Box::new(FakeLookup {
            available,
            answers: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    #[test]
    fn test_builtin_libc6() {
        let mapping = DependencyResolver::default().resolve("libc6");
        assert_eq!(mapping.original(), "libc6");
        assert_eq!(mapping.target(), Some("glibc"));
        assert_eq!(mapping.status(), MappingStatus::Mapped);
        assert_eq!(mapping.source(), MappingSource::Builtin);
    }

    #[test]
    fn test_fuzzy_python() {
        let mapping = DependencyResolver::default().resolve("python3-requests");
        assert_eq!(mapping.target(), Some("python-requests"));
        assert_eq!(mapping.source(), MappingSource::Fuzzy);
    }

    #[test]
    fn test_unknown_is_unmapped() {
        let mapping = DependencyResolver::default().resolve("totally-unknown-pkg-9000");
        assert_eq!(mapping.target(), None);
        assert_eq!(mapping.status(), MappingStatus::Unmapped);
        assert_eq!(mapping.source(), MappingSource::None);
        assert!(!mapping.is_resolved());
    }

    #[test]
    fn test_user_override_beats_builtin() {
        let overrides = HashMap::from([("libc6".to_string(), "musl".to_string())]);
        let resolver = DependencyResolver::default().with_user_overrides(overrides);
        let mapping = resolver.resolve("libc6");
        assert_eq!(mapping.target(), Some("musl"));
        assert_eq!(mapping.source(), MappingSource::User);
    }

    #[test]
    fn test_user_override_beats_skip_list() {
        let overrides = HashMap::from([("debconf".to_string(), "my-debconf".to_string())]);
        let resolver = DependencyResolver::default().with_user_overrides(overrides);
        assert_eq!(resolver.resolve("debconf").target(), Some("my-debconf"));
    }

    #[test]
    fn test_virtual_first_alternative() {
        let resolver = DependencyResolver::default();
        let mapping = resolver.resolve("www-browser");
        assert_eq!(mapping.target(), Some("firefox"));
        assert_eq!(mapping.status(), MappingStatus::Virtual);
        assert_eq!(mapping.source(), MappingSource::VirtualTable);
        assert!(mapping.is_resolved());

        let alternatives = resolver.virtual_alternatives("editor").unwrap();
        assert_eq!(alternatives, ["vim", "nano", "vi"]);
        assert!(resolver.virtual_alternatives("libc6").is_none());
        assert_eq!(resolver.virtual_alternatives("editor:any").unwrap().len(), 3);
    }

    #[test]
    fn test_skipped_packages() {
        let mapping = DependencyResolver::default().resolve("debconf");
        assert_eq!(mapping.status(), MappingStatus::Skipped);
        assert_eq!(mapping.source(), MappingSource::Builtin);
        assert_eq!(mapping.target(), None);
        assert!(!mapping.is_resolved());
    }

    #[test]
    fn test_external_lookup_tier() {
        let resolver = DependencyResolver::default()
            .with_lookup(fake(true, &[("lsof", "lsof"), ("libfoo3", "foo")]));
        assert!(resolver.has_lookup());

        let mapping = resolver.resolve("lsof");
        assert_eq!(mapping.source(), MappingSource::ExternalLookup);

        // Lookup answers before the heuristics do
        assert_eq!(resolver.resolve("libfoo3").target(), Some("foo"));
        // Built-ins still come first
        assert_eq!(resolver.resolve("libc6").source(), MappingSource::Builtin);
    }

    #[test]
    fn test_unavailable_lookup_not_consulted() {
        let resolver = DependencyResolver::default().with_lookup(fake(false, &[("lsof", "lsof")]));
        assert!(!resolver.has_lookup());
        assert_eq!(resolver.resolve("lsof").status(), MappingStatus::Unmapped);
    }

    #[test]
    fn test_empty_tables() {
        let resolver = DependencyResolver::new(MappingTables::empty());
        assert_eq!(resolver.resolve("libc6").status(), MappingStatus::Unmapped);

        let resolver = DependencyResolver::new(
            MappingTables::empty()
                .with_name("foo", "bar")
                .with_virtual("fooish", ["baz", "qux"])
                .with_skipped("dpkg"),
        );
        assert_eq!(resolver.resolve("foo").target(), Some("bar"));
        assert_eq!(resolver.resolve("fooish").target(), Some("baz"));
        assert_eq!(resolver.resolve("dpkg").status(), MappingStatus::Skipped);
    }

    #[test]
    fn test_fuzzy_rules() {
        assert_eq!(fuzzy_match("python3-yaml").as_deref(), Some("python-yaml"));
        assert_eq!(fuzzy_match("libfoo-dev").as_deref(), Some("libfoo"));
        assert_eq!(fuzzy_match("libbar2").as_deref(), Some("libbar"));
        assert_eq!(fuzzy_match("libbaz123").as_deref(), Some("libbaz"));
        assert_eq!(fuzzy_match("python3-").as_deref(), None);
        assert_eq!(fuzzy_match("-dev"), None);
        assert_eq!(fuzzy_match("lib1"), None);
        assert_eq!(fuzzy_match("zsh"), None);
    }

    #[test]
    fn test_resolve_all_preserves_order() {
        let resolver = DependencyResolver::default();
        let mappings = resolver.resolve_all(["zlib1g", "libc6", "mystery-pkg"]);
        let originals: Vec<&str> = mappings.iter().map(|m| m.original()).collect();
        assert_eq!(originals, vec!["zlib1g", "libc6", "mystery-pkg"]);
        assert_eq!(mappings[2].status(), MappingStatus::Unmapped);
    }

    #[test]
    fn test_qualified_tokens_keep_original() {
        let resolver = DependencyResolver::default();

        let mapping = resolver.resolve("libc6 (>= 2.34)");
        assert_eq!(mapping.target(), Some("glibc"));
        assert_eq!(mapping.source(), MappingSource::Builtin);
        assert_eq!(mapping.original(), "libc6 (>= 2.34)");

        let mapping = resolver.resolve("python3-requests:any");
        assert_eq!(mapping.target(), Some("python-requests"));
        assert_eq!(mapping.original(), "python3-requests:any");

        let mapping = resolver.resolve("zlib1g (>= 1:1.2.0) | libz-mystery");
        assert_eq!(mapping.target(), Some("zlib"));

        let mapping = resolver.resolve("mystery-pkg (<< 3)");
        assert_eq!(mapping.status(), MappingStatus::Unmapped);
        assert_eq!(mapping.to_string(), "mystery-pkg (<< 3) (unmapped)");
    }

    #[test]
    fn test_empty_token_unmapped() {
        let mapping = DependencyResolver::default().resolve("   ");
        assert_eq!(mapping.status(), MappingStatus::Unmapped);
    }

    #[test]
    fn test_display() {
        let resolver = DependencyResolver::default();
        assert_eq!(
            resolver.resolve("libc6").to_string(),
            "libc6 -> glibc (mapped, builtin)"
        );
        assert_eq!(resolver.resolve("nope-nope").to_string(), "nope-nope (unmapped)");
    }
}
