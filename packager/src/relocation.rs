//! Package relocation rules for shaded jars.
//!
//! A relocation rewrites a class-name prefix (`com.acme.`) to a shaded prefix
//! (`shaded.com.acme.`) while the packaged jar is assembled. The merger needs
//! the same rewrite to turn the package list of a plain input jar into the
//! packages the output jar will actually contain.

use glob::Pattern;
use thiserror::Error;

/// Errors arising from relocation rule construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelocationError {
    /// An include or exclude pattern is not a valid glob.
    #[error("invalid relocation filter '{pattern}': {reason}")]
    InvalidFilter {
        /// The rejected pattern.
        pattern: String,
        /// Description of the problem.
        reason: String,
    },
}

/// A single `pattern -> shaded` prefix rewrite.
///
/// Optional include and exclude globs restrict which class names the rule
/// applies to. Globs match dotted class names and `*` spans dots.
///
/// # Examples
///
/// ```
/// use packwright_packager::relocation::RelocationRule;
///
/// let rule = RelocationRule::new("com.acme.", "shaded.com.acme.");
/// assert!(rule.can_relocate_class("com.acme.core.Engine"));
/// assert_eq!(rule.relocate_class("com.acme.core.Engine"), "shaded.com.acme.core.Engine");
/// ```
#[derive(Debug, Clone)]
pub struct RelocationRule {
    pattern: String,
    shaded: String,
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl RelocationRule {
    /// Creates an unrestricted rule.
    #[must_use]
    pub fn new(pattern: impl Into<String>, shaded: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            shaded: shaded.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// Restricts the rule to class names matching `glob`.
    ///
    /// # Errors
    ///
    /// Returns [`RelocationError::InvalidFilter`] for a malformed glob.
    pub fn include(mut self, glob: &str) -> Result<Self, RelocationError> {
        self.includes.push(compile_filter(glob)?);
        Ok(self)
    }

    /// Exempts class names matching `glob` from the rule.
    ///
    /// # Errors
    ///
    /// Returns [`RelocationError::InvalidFilter`] for a malformed glob.
    pub fn exclude(mut self, glob: &str) -> Result<Self, RelocationError> {
        self.excludes.push(compile_filter(glob)?);
        Ok(self)
    }

    /// The original prefix.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The replacement prefix.
    #[must_use]
    pub fn shaded(&self) -> &str {
        &self.shaded
    }

    /// Returns `true` when this rule rewrites `class_name`.
    #[must_use]
    pub fn can_relocate_class(&self, class_name: &str) -> bool {
        class_name.starts_with(&self.pattern)
            && (self.includes.is_empty() || self.includes.iter().any(|p| p.matches(class_name)))
            && !self.excludes.iter().any(|p| p.matches(class_name))
    }

    /// Rewrites the prefix of `class_name`, leaving non-matching names alone.
    #[must_use]
    pub fn relocate_class(&self, class_name: &str) -> String {
        class_name
            .strip_prefix(&self.pattern)
            .map_or_else(|| class_name.to_owned(), |rest| format!("{}{rest}", self.shaded))
    }
}

fn compile_filter(glob: &str) -> Result<Pattern, RelocationError> {
    Pattern::new(glob).map_err(|e| RelocationError::InvalidFilter {
        pattern: glob.to_owned(),
        reason: e.msg.to_owned(),
    })
}

/// The ordered relocation rules of one packaged jar.
#[derive(Debug, Clone, Default)]
pub struct Relocations {
    rules: Vec<RelocationRule>,
}

impl Relocations {
    /// Creates an empty rule list; every package maps to itself.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule after all previously declared rules.
    pub fn push(&mut self, rule: RelocationRule) {
        self.rules.push(rule);
    }

    /// Rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[RelocationRule] {
        &self.rules
    }

    /// Maps a package name to its name inside the packaged jar.
    ///
    /// Rules are tried from the last declared to the first, against
    /// `package + "."`; the first rule that applies wins. Without a match the
    /// package is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use packwright_packager::relocation::{RelocationRule, Relocations};
    ///
    /// let mut relocations = Relocations::new();
    /// relocations.push(RelocationRule::new("com.acme.", "shaded.com.acme."));
    /// assert_eq!(relocations.relocate_package("com.acme.core"), "shaded.com.acme.core");
    /// assert_eq!(relocations.relocate_package("org.other"), "org.other");
    /// ```
    #[must_use]
    pub fn relocate_package(&self, package: &str) -> String {
        let class_prefix = format!("{package}.");
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.can_relocate_class(&class_prefix))
            .map_or_else(
                || package.to_owned(),
                |rule| {
                    let relocated = rule.relocate_class(&class_prefix);
                    match relocated.strip_suffix('.') {
                        Some(trimmed) => trimmed.to_owned(),
                        None => relocated,
                    }
                },
            )
    }
}

impl FromIterator<RelocationRule> for Relocations {
    fn from_iter<I: IntoIterator<Item = RelocationRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
