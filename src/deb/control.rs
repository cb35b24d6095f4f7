// src/deb/control.rs

//! Debian control file parser
//!
//! The control file is an RFC 822-style record: `Field: value` lines, with
//! continuation lines (leading space or tab) belonging to the field above.
//! A continuation line holding only `.` stands for an empty line inside a
//! multi-line value (used by `Description`).
//!
//! Relationship fields (`Depends`, `Pre-Depends`, ...) use their own grammar:
//! comma separated clauses, each clause one or more `|` separated
//! alternatives, each alternative optionally carrying a `(op version)`
//! constraint and a `:arch` qualifier. Only the first alternative of each
//! clause is kept.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Debian architecture, a closed set with a fallback to `all`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DebArch {
    I386,
    Amd64,
    Armhf,
    Arm64,
    Armel,
    Mips,
    Mipsel,
    Mips64el,
    Ppc64el,
    S390x,
    #[default]
    All,
}

impl DebArch {
    /// Every recognized Debian architecture token
    pub const ALL_VARIANTS: [DebArch; 11] = [
        Self::I386,
        Self::Amd64,
        Self::Armhf,
        Self::Arm64,
        Self::Armel,
        Self::Mips,
        Self::Mipsel,
        Self::Mips64el,
        Self::Ppc64el,
        Self::S390x,
        Self::All,
    ];

    /// Parse a Debian architecture token. Unknown tokens become `All`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "i386" => Self::I386,
            "amd64" => Self::Amd64,
            "armhf" => Self::Armhf,
            "arm64" => Self::Arm64,
            "armel" => Self::Armel,
            "mips" => Self::Mips,
            "mipsel" => Self::Mipsel,
            "mips64el" => Self::Mips64el,
            "ppc64el" => Self::Ppc64el,
            "s390x" => Self::S390x,
            _ => Self::All,
        }
    }

    /// The Debian spelling of this architecture
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I386 => "i386",
            Self::Amd64 => "amd64",
            Self::Armhf => "armhf",
            Self::Arm64 => "arm64",
            Self::Armel => "armel",
            Self::Mips => "mips",
            Self::Mipsel => "mipsel",
            Self::Mips64el => "mips64el",
            Self::Ppc64el => "ppc64el",
            Self::S390x => "s390x",
            Self::All => "all",
        }
    }

    /// The Arch Linux equivalent (`arch = ...` in .PKGINFO)
    ///
    /// Architectures without a distinct Arch spelling keep their Debian name.
    pub fn to_arch(&self) -> &'static str {
        match self {
            Self::I386 => "i686",
            Self::Amd64 => "x86_64",
            Self::Armhf => "armv7h",
            Self::Arm64 => "aarch64",
            Self::Armel => "arm",
            Self::All => "any",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for DebArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared relationship: the bare package name and the clause as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    /// Bare package name, e.g. `libc6`
    pub name: String,
    /// Clause exactly as declared, e.g. `libc6 (>= 2.34) | libc6.1`
    pub declared: String,
}

/// An ordered relationship field (`Depends`, `Conflicts`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyList {
    entries: Vec<DeclaredDependency>,
}

impl DependencyList {
    /// Parse a relationship field value
    pub fn parse(value: &str) -> Self {
        let entries = value
            .split(',')
            .filter_map(|clause| {
                let declared = clause.trim();
                clean_dependency_token(declared).map(|name| DeclaredDependency {
                    name,
                    declared: declared.to_string(),
                })
            })
            .collect();

        Self { entries }
    }

    /// Bare names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeclaredDependency> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parsed Debian control file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMetadata {
    pub package: String,
    pub version: String,
    pub architecture: DebArch,
    pub maintainer: Option<String>,
    /// Installed size in KiB, as declared
    pub installed_size: Option<u64>,
    /// Full description: synopsis line, then the extended text
    pub description: String,
    pub depends: DependencyList,
    pub pre_depends: DependencyList,
    pub recommends: DependencyList,
    pub suggests: DependencyList,
    pub conflicts: DependencyList,
    pub breaks: DependencyList,
    pub provides: DependencyList,
    pub replaces: DependencyList,
    pub section: Option<String>,
    pub priority: Option<String>,
    pub homepage: Option<String>,
    pub source: Option<String>,
}

impl ControlMetadata {
    /// First line of the description
    pub fn synopsis(&self) -> &str {
        self.description.lines().next().unwrap_or("").trim()
    }
}

/// Parse control file text
pub fn parse_control(text: &str) -> Result<ControlMetadata> {
    let fields = tokenize_fields(text)?;

    let get = |name: &str| -> Option<String> {
        fields
            .get(&name.to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .cloned()
    };
    let deps = |name: &str| -> DependencyList {
        fields
            .get(&name.to_ascii_lowercase())
            .map(|v| DependencyList::parse(v))
            .unwrap_or_default()
    };

    let package = get("Package")
        .ok_or_else(|| Error::ParseError("Control file missing required 'Package' field".to_string()))?;
    let version = get("Version")
        .ok_or_else(|| Error::ParseError("Control file missing required 'Version' field".to_string()))?;

    let architecture = get("Architecture")
        .map(|a| DebArch::from_token(&a))
        .unwrap_or_default();

    let installed_size = get("Installed-Size").and_then(|s| match s.trim().parse::<u64>() {
        Ok(size) => Some(size),
        Err(_) => {
            debug!("Ignoring non-numeric Installed-Size: {}", s);
            None
        }
    });

    let control = ControlMetadata {
        package,
        version,
        architecture,
        maintainer: get("Maintainer"),
        installed_size,
        description: get("Description").unwrap_or_default(),
        depends: deps("Depends"),
        pre_depends: deps("Pre-Depends"),
        recommends: deps("Recommends"),
        suggests: deps("Suggests"),
        conflicts: deps("Conflicts"),
        breaks: deps("Breaks"),
        provides: deps("Provides"),
        replaces: deps("Replaces"),
        section: get("Section"),
        priority: get("Priority"),
        homepage: get("Homepage"),
        source: get("Source"),
    };

    debug!(
        "Parsed control for {} {} ({}, {} depends)",
        control.package,
        control.version,
        control.architecture,
        control.depends.len()
    );

    Ok(control)
}

/// Split control text into a field map keyed by lower-cased field name
///
/// The record itself is read by `rfc822_like`. Around it: comment lines are
/// dropped, only the first record is kept, line shape is checked up front so
/// errors name a line, and ` .` continuation lines become empty lines.
fn tokenize_fields(text: &str) -> Result<HashMap<String, String>> {
    let record = first_record(text)?;
    if record.is_empty() {
        return Err(Error::ParseError("Control file contains no fields".to_string()));
    }

    let mut records: Vec<HashMap<String, String>> = rfc822_like::from_str(&record)
        .map_err(|e| Error::ParseError(format!("Malformed control record: {}", e)))?;
    if records.is_empty() {
        return Err(Error::ParseError("Control file contains no fields".to_string()));
    }

    let fields = records
        .swap_remove(0)
        .into_iter()
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), unfold_value(&value)))
        .collect();

    Ok(fields)
}

/// Lines of the first record, comments removed, each checked for shape
fn first_record(text: &str) -> Result<String> {
    let mut record = String::new();
    let mut seen_field = false;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;

        if line.trim().is_empty() {
            if seen_field {
                break;
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            if !seen_field {
                return Err(Error::ParseError(format!(
                    "line {}: continuation line without a preceding field",
                    line_no
                )));
            }
        } else {
            let (key, _) = line.split_once(':').ok_or_else(|| {
                Error::ParseError(format!("line {}: expected 'Field: value', got '{}'", line_no, line))
            })?;
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(Error::ParseError(format!(
                    "line {}: invalid field name '{}'",
                    line_no, key
                )));
            }
            seen_field = true;
        }

        record.push_str(line);
        record.push('\n');
    }

    Ok(record)
}

/// Trim a folded value line by line; a lone `.` encodes an empty line
fn unfold_value(value: &str) -> String {
    let mut lines = value.lines();
    let mut out = lines.next().unwrap_or("").trim().to_string();
    for line in lines {
        let line = line.trim();
        out.push('\n');
        if line != "." {
            out.push_str(line);
        }
    }
    out
}

/// Parse a comma-separated relationship field into bare package names
///
/// For alternatives (`a | b`) only the first is kept.
///
/// # Examples
///
/// ```
/// use deb2arch::deb::control::parse_dependency_list;
///
/// assert_eq!(
///     parse_dependency_list("libc6 (>= 2.34), libssl3 | libssl1.1, python3:any"),
///     vec!["libc6", "libssl3", "python3"]
/// );
/// ```
pub fn parse_dependency_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(clean_dependency_token)
        .collect()
}

/// Reduce one relationship clause to a bare package name
///
/// Drops every alternative after the first, the version constraint, and the
/// architecture qualifier. Returns `None` when nothing is left.
pub fn clean_dependency_token(clause: &str) -> Option<String> {
    let first = clause.split('|').next().unwrap_or("");
    let without_version = first.split('(').next().unwrap_or("");
    // Build profile restrictions (`<!nocheck>`) and arch lists (`[amd64]`)
    let without_restrictions = without_version
        .split(['[', '<'])
        .next()
        .unwrap_or("");
    let name = without_restrictions.split(':').next().unwrap_or("").trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Convert a Debian version into a valid Arch `pkgver`
///
/// - Drops the epoch (`1:2.3.4` -> `2.3.4`)
/// - Replaces `-`, `~` and `+` with `_`
///
/// The conversion is one-way.
///
/// # Examples
///
/// ```
/// use deb2arch::deb::control::normalize_version;
///
/// assert_eq!(normalize_version("2.10-3"), "2.10_3");
/// assert_eq!(normalize_version("1:2.0.0~beta1-1ubuntu2"), "2.0.0_beta1_1ubuntu2");
/// ```
pub fn normalize_version(version: &str) -> String {
    let without_epoch = match version.split_once(':') {
        Some((_, rest)) => rest,
        None => version,
    };

    without_epoch.replace(['-', '~', '+'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_CONTROL: &str = "Package: hello
Version: 2.10-3
Architecture: amd64
Maintainer: Santiago Vila <sanvila@debian.org>
Installed-Size: 277
Depends: libc6 (>= 2.34)
Conflicts: hello-traditional
Breaks: hello-debhelper (<< 2.9)
Replaces: hello-debhelper (<< 2.9), hello-traditional
Section: devel
Priority: optional
Homepage: https://www.gnu.org/software/hello/
Description: example package based on GNU hello
 The GNU hello program produces a familiar, friendly greeting.  It
 allows non-programmers to use a classic computer science tool which
 would otherwise be unavailable to them.
 .
 Seriously, though: this is an example of how to do a Debian package.
";

    const COMPLEX_CONTROL: &str = "Package: test-complex
Version: 1:2.0.0~beta1-1ubuntu2
Architecture: amd64
Maintainer: Test <test@example.com>
Depends: libc6 (>= 2.34), libssl3 | libssl1.1, python3 (>= 3.10) | python3.9
Pre-Depends: dpkg (>= 1.19.0)
Recommends: vim | emacs, git
Suggests: docker-ce
Conflicts: test-old
Provides: test-provider
Description: complex dependencies
";

    #[test]
    fn test_parse_hello() {
        let control = parse_control(HELLO_CONTROL).unwrap();
        assert_eq!(control.package, "hello");
        assert_eq!(control.version, "2.10-3");
        assert_eq!(control.architecture, DebArch::Amd64);
        assert_eq!(control.depends.names(), vec!["libc6"]);
        assert_eq!(control.installed_size, Some(277));
        assert_eq!(control.section.as_deref(), Some("devel"));
        assert_eq!(
            control.homepage.as_deref(),
            Some("https://www.gnu.org/software/hello/")
        );
        assert_eq!(control.replaces.names(), vec!["hello-debhelper", "hello-traditional"]);
        assert_eq!(control.breaks.names(), vec!["hello-debhelper"]);
    }

    #[test]
    fn test_minimal_scenario() {
        let text = "Package: hello\nVersion: 2.10-3\nArchitecture: amd64\nDepends: libc6 (>= 2.34)\n";
        let control = parse_control(text).unwrap();
        assert_eq!(control.package, "hello");
        assert_eq!(control.version, "2.10-3");
        assert_eq!(control.architecture.as_str(), "amd64");
        assert_eq!(control.depends.names(), vec!["libc6"]);
    }

    #[test]
    fn test_description_continuation() {
        let control = parse_control(HELLO_CONTROL).unwrap();
        assert_eq!(control.synopsis(), "example package based on GNU hello");
        let lines: Vec<&str> = control.description.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[4], "");
        assert!(lines[5].starts_with("Seriously"));
    }

    #[test]
    fn test_parse_complex_dependencies() {
        let control = parse_control(COMPLEX_CONTROL).unwrap();
        assert_eq!(control.depends.names(), vec!["libc6", "libssl3", "python3"]);
        assert_eq!(control.pre_depends.names(), vec!["dpkg"]);
        assert_eq!(control.recommends.names(), vec!["vim", "git"]);
        assert_eq!(control.suggests.names(), vec!["docker-ce"]);
        assert_eq!(control.provides.names(), vec!["test-provider"]);
        assert_eq!(control.version, "1:2.0.0~beta1-1ubuntu2");
    }

    #[test]
    fn test_declared_clause_kept_verbatim() {
        let control = parse_control(COMPLEX_CONTROL).unwrap();
        let declared: Vec<&str> = control.depends.iter().map(|d| d.declared.as_str()).collect();
        assert_eq!(
            declared,
            vec!["libc6 (>= 2.34)", "libssl3 | libssl1.1", "python3 (>= 3.10) | python3.9"]
        );
    }

    #[test]
    fn test_missing_package_field() {
        let err = parse_control("Version: 1.0\nArchitecture: all\n").unwrap_err();
        assert!(matches!(err, Error::ParseError(ref m) if m.contains("Package")));
    }

    #[test]
    fn test_missing_version_field() {
        let err = parse_control("Package: foo\n").unwrap_err();
        assert!(matches!(err, Error::ParseError(ref m) if m.contains("Version")));
    }

    #[test]
    fn test_empty_version_is_missing() {
        assert!(parse_control("Package: foo\nVersion:\n").is_err());
    }

    #[test]
    fn test_malformed_line_rejected() {
        let err = parse_control("Package: foo\nthis is not a field\nVersion: 1\n").unwrap_err();
        assert!(matches!(err, Error::ParseError(ref m) if m.contains("line 2")));
    }

    #[test]
    fn test_leading_continuation_rejected() {
        assert!(parse_control(" orphan continuation\nPackage: foo\nVersion: 1\n").is_err());
    }

    #[test]
    fn test_comments_and_folded_description() {
        let text = "# generated\nPackage: foo\n# inline comment\nVersion: 1\nDescription: short\n first\n .\n second\n";
        let control = parse_control(text).unwrap();
        assert_eq!(control.package, "foo");
        assert_eq!(control.version, "1");
        assert_eq!(control.description, "short\nfirst\n\nsecond");
    }

    #[test]
    fn test_invalid_field_name_rejected() {
        let err = parse_control("Package: foo\nBad Field: x\nVersion: 1\n").unwrap_err();
        assert!(matches!(err, Error::ParseError(ref m) if m.contains("line 2")));
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(parse_control("").is_err());
        assert!(parse_control("\n\n").is_err());
    }

    #[test]
    fn test_field_names_case_insensitive() {
        let control = parse_control("package: foo\nVERSION: 1.0\narchitecture: arm64\n").unwrap();
        assert_eq!(control.package, "foo");
        assert_eq!(control.architecture, DebArch::Arm64);
    }

    #[test]
    fn test_only_first_record_is_read() {
        let text = "Package: first\nVersion: 1\n\nPackage: second\nVersion: 2\n";
        let control = parse_control(text).unwrap();
        assert_eq!(control.package, "first");
    }

    #[test]
    fn test_bad_installed_size_ignored() {
        let control = parse_control("Package: foo\nVersion: 1\nInstalled-Size: lots\n").unwrap();
        assert_eq!(control.installed_size, None);
    }

    #[test]
    fn test_missing_architecture_defaults_to_all() {
        let control = parse_control("Package: foo\nVersion: 1\n").unwrap();
        assert_eq!(control.architecture, DebArch::All);
        assert_eq!(control.architecture.to_arch(), "any");
    }

    #[test]
    fn test_dependency_list_token_properties() {
        let inputs = [
            "libc6 (>= 2.34), libssl3 | libssl1.1, python3:any (>= 3.10)",
            " , a,, b (= 1) ,c:amd64|d ,",
            "foo [amd64] <!nocheck>, bar:native",
            "",
        ];

        for input in inputs {
            let tokens = parse_dependency_list(input);
            let clauses = input
                .split(',')
                .filter(|c| clean_dependency_token(c).is_some())
                .count();
            let non_empty = input.split(',').filter(|c| !c.trim().is_empty()).count();

            assert_eq!(tokens.len(), clauses);
            assert_eq!(tokens.len(), non_empty, "{input}");
            for token in &tokens {
                assert!(!token.contains('('), "{token}");
                assert!(!token.contains('|'), "{token}");
                assert!(!token.contains(':'), "{token}");
                assert!(!token.contains(' '), "{token}");
            }
        }
    }

    #[test]
    fn test_dependency_list_order_and_cleaning() {
        assert_eq!(
            parse_dependency_list(" , a,, b (= 1) ,c:amd64|d ,"),
            vec!["a", "b", "c"]
        );
        assert!(parse_dependency_list("   ").is_empty());
    }

    #[test]
    fn test_normalize_version() {
        assert_eq!(normalize_version("2.10-3"), "2.10_3");
        assert_eq!(normalize_version("1:2.3.4"), "2.3.4");
        assert_eq!(normalize_version("2.3.4~beta"), "2.3.4_beta");
        assert_eq!(normalize_version("1.0+dfsg-2"), "1.0_dfsg_2");
        assert_eq!(normalize_version("1.0"), "1.0");
        assert_eq!(normalize_version(""), "");
    }

    #[test]
    fn test_normalize_version_removes_separators_and_epoch() {
        for input in ["1:2.0~rc1+git-3", "5:1-1:2", "0:~+-", "7:"] {
            let out = normalize_version(input);
            assert!(!out.contains(['-', '~', '+']), "{input} -> {out}");
            let (_, rest) = input.split_once(':').unwrap();
            assert_eq!(out, rest.replace(['-', '~', '+'], "_"));
        }
    }

    #[test]
    fn test_arch_mapping_total() {
        assert_eq!(DebArch::from_token("amd64").to_arch(), "x86_64");
        assert_eq!(DebArch::from_token("i386").to_arch(), "i686");
        assert_eq!(DebArch::from_token("armhf").to_arch(), "armv7h");
        assert_eq!(DebArch::from_token("arm64").to_arch(), "aarch64");
        assert_eq!(DebArch::from_token("armel").to_arch(), "arm");
        assert_eq!(DebArch::from_token("all").to_arch(), "any");
        assert_eq!(DebArch::from_token("ppc64el").to_arch(), "ppc64el");

        for arch in DebArch::ALL_VARIANTS {
            assert!(!arch.to_arch().is_empty());
            assert_eq!(DebArch::from_token(arch.as_str()), arch);
        }
    }

    #[test]
    fn test_unknown_arch_falls_back() {
        assert_eq!(DebArch::from_token("hurd-i386"), DebArch::All);
        assert_eq!(DebArch::from_token(""), DebArch::All);
        assert_eq!(DebArch::from_token("AMD64"), DebArch::Amd64);
    }
}
