//! Maven to OSGi version conversion for `Bundle-Version`.
//!
//! OSGi versions are strictly `major.minor.micro[.qualifier]` with numeric
//! components and a qualifier restricted to letters, digits, `-` and `_`.
//! Maven versions are looser (`1.2-SNAPSHOT`, `3.0.0.RC1`), so packaged
//! bundles derive their default `Bundle-Version` through [`OsgiVersion::from_maven`].

use crate::export::compile_regex;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Manifest header carrying the bundle's version.
pub const BUNDLE_VERSION: &str = "Bundle-Version";

static MAVEN_VERSION: Lazy<Regex> = Lazy::new(|| {
    compile_regex(
        r"^(\d{1,9})(?:\.(\d{1,9})(?:\.(\d{1,9}))?)?(?:[.-]?(.+))?$",
        "maven version pattern should compile",
    )
});

/// A well-formed OSGi version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OsgiVersion {
    major: u32,
    minor: u32,
    micro: u32,
    qualifier: Option<String>,
}

impl OsgiVersion {
    /// Converts a Maven version string into an OSGi version.
    ///
    /// Missing numeric components default to zero. Characters outside the
    /// OSGi qualifier alphabet become `_`. A version that does not start with
    /// a number is kept whole as the qualifier of `0.0.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use packwright_common::version::OsgiVersion;
    ///
    /// assert_eq!(OsgiVersion::from_maven("1.2.3-SNAPSHOT").to_string(), "1.2.3.SNAPSHOT");
    /// assert_eq!(OsgiVersion::from_maven("2.1").to_string(), "2.1.0");
    /// ```
    #[must_use]
    pub fn from_maven(version: &str) -> Self {
        let trimmed = version.trim();
        let Some(captures) = MAVEN_VERSION.captures(trimmed) else {
            debug!("version `{trimmed}` has no numeric prefix; using it as a qualifier");
            return Self {
                major: 0,
                minor: 0,
                micro: 0,
                qualifier: clean_qualifier(trimmed),
            };
        };

        let number = |index: usize| {
            captures
                .get(index)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0)
        };

        Self {
            major: number(1),
            minor: number(2),
            micro: number(3),
            qualifier: captures
                .get(4)
                .and_then(|m| clean_qualifier(m.as_str())),
        }
    }

    /// The major component.
    #[must_use]
    pub const fn major(&self) -> u32 {
        self.major
    }

    /// The minor component.
    #[must_use]
    pub const fn minor(&self) -> u32 {
        self.minor
    }

    /// The micro component.
    #[must_use]
    pub const fn micro(&self) -> u32 {
        self.micro
    }

    /// The qualifier, if any.
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl fmt::Display for OsgiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, ".{qualifier}")?;
        }
        Ok(())
    }
}

fn clean_qualifier(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
    )
}
