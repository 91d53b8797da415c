//! `Export-Package` instruction helpers.
//!
//! An `Export-Package` header is a comma-separated list of instructions, each
//! a package name (or pattern) followed by `;`-separated parameter clauses
//! such as `version="1.2.3"` or `uses:="com.acme.api"`. Clause values may be
//! quoted and quoted values may contain commas, so the header cannot be split
//! on every comma.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;

/// Manifest header listing the packages a bundle exposes.
pub const EXPORT_PACKAGE: &str = "Export-Package";

/// No-op regex token placed before derived package patterns.
///
/// Bundling tools treat instructions without wildcard characters as literal
/// package names, and a literal export overrides earlier negations. An
/// optional digit class matches nothing extra in a package name while forcing
/// pattern semantics.
pub const NO_OP_MARKER: &str = "[0-9]?";

/// Compiles a pattern that is known to be valid.
pub(crate) fn compile_regex(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|error| panic!("{context}: {error}"))
}

// Escaped quotes inside clause values are not supported. Clause values must
// be quoted: in `com.bar;version=1.0` only `version=1.0` is recognised and the
// package name is lost.
static EXPORT_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    compile_regex(
        r#"([^;,]+((?:;[^,:=]+:?="[^"]+")*))(?:,|$)"#,
        "export instruction pattern should compile",
    )
});

static USES_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    compile_regex(
        r#";uses:?=(?:"[^"]+"|[^;,"]+)"#,
        "uses clause pattern should compile",
    )
});

/// Errors arising from instruction parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    /// The instruction text could not be interpreted.
    #[error("malformed export instruction `{instruction}`: {reason}")]
    Malformed {
        /// The offending instruction.
        instruction: String,
        /// Description of the problem.
        reason: String,
    },
}

/// Splits an `Export-Package` header into its top-level instructions.
///
/// Quoted clause values are kept intact even when they contain commas.
///
/// # Examples
///
/// ```
/// use packwright_common::export::split_export_header;
///
/// let fragments = split_export_header(r#"com.foo;uses:="com.bar,com.qux",com.baz"#);
/// assert_eq!(fragments, vec![r#"com.foo;uses:="com.bar,com.qux""#, "com.baz"]);
/// ```
#[must_use]
pub fn split_export_header(header: &str) -> Vec<&str> {
    EXPORT_CLAUSE
        .captures_iter(header)
        .filter_map(|captures| captures.get(1))
        .map(|fragment| fragment.as_str())
        .collect()
}

/// Removes every `uses` directive from an instruction.
///
/// # Examples
///
/// ```
/// use packwright_common::export::strip_uses;
///
/// assert_eq!(strip_uses(r#"com.foo;uses:="com.bar";version="1.0""#), r#"com.foo;version="1.0""#);
/// ```
#[must_use]
pub fn strip_uses(fragment: &str) -> Cow<'_, str> {
    USES_CLAUSE.replace_all(fragment, "")
}

/// Prefixes an instruction with [`NO_OP_MARKER`].
#[must_use]
pub fn with_marker(fragment: &str) -> String {
    format!("{NO_OP_MARKER}{fragment}")
}

/// A single parameter clause of an export instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Clause name, for example `version` or `uses`.
    pub key: String,
    /// `true` for directives (`key:=value`), `false` for attributes.
    pub directive: bool,
    /// Raw value, including any surrounding quotes.
    pub value: String,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.directive { ":=" } else { "=" };
        write!(f, "{}{separator}{}", self.key, self.value)
    }
}

/// A structured export instruction: a package plus ordered clauses.
///
/// # Examples
///
/// ```
/// use packwright_common::export::ExportInstruction;
///
/// let instruction = ExportInstruction::new("com.acme.core").with_attribute("version", "1.2.3");
/// assert_eq!(instruction.to_string(), r#"com.acme.core;version="1.2.3""#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportInstruction {
    package: String,
    clauses: Vec<Clause>,
}

impl ExportInstruction {
    /// Creates an instruction with no clauses.
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            clauses: Vec::new(),
        }
    }

    /// Parses a single instruction such as `com.foo;version="1.0"`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Malformed`] when the package name is blank, a
    /// quote is left open, or a clause lacks `=`.
    pub fn parse(instruction: &str) -> Result<Self, ExportError> {
        let malformed = |reason: &str| ExportError::Malformed {
            instruction: instruction.to_owned(),
            reason: reason.to_owned(),
        };

        let segments = split_clauses(instruction).ok_or_else(|| malformed("unterminated quote"))?;
        let mut segments = segments.into_iter();
        let package = segments.next().map(str::trim).unwrap_or_default();
        if package.is_empty() {
            return Err(malformed("missing package name"));
        }

        let mut clauses = Vec::new();
        for segment in segments {
            let (key, directive, value) = if let Some((key, value)) = segment.split_once(":=") {
                (key, true, value)
            } else if let Some((key, value)) = segment.split_once('=') {
                (key, false, value)
            } else {
                return Err(malformed("clause without `=`"));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(malformed("clause without a name"));
            }
            clauses.push(Clause {
                key: key.to_owned(),
                directive,
                value: value.trim().to_owned(),
            });
        }

        Ok(Self {
            package: package.to_owned(),
            clauses,
        })
    }

    /// Appends a quoted attribute clause.
    #[must_use]
    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.clauses.push(Clause {
            key: key.to_owned(),
            directive: false,
            value: format!("\"{value}\""),
        });
        self
    }

    /// Returns a copy of this instruction that exports `package` instead.
    #[must_use]
    pub fn for_package(&self, package: &str) -> Self {
        Self {
            package: package.to_owned(),
            clauses: self.clauses.clone(),
        }
    }

    /// The package name or pattern.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Clauses in declaration order.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Returns the raw value of the first clause called `key`.
    #[must_use]
    pub fn clause(&self, key: &str) -> Option<&str> {
        self.clauses
            .iter()
            .find(|clause| clause.key == key)
            .map(|clause| clause.value.as_str())
    }

    /// Drops every clause called `key`.
    #[must_use]
    pub fn without(mut self, key: &str) -> Self {
        self.clauses.retain(|clause| clause.key != key);
        self
    }
}

impl fmt::Display for ExportInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.package)?;
        for clause in &self.clauses {
            write!(f, ";{clause}")?;
        }
        Ok(())
    }
}

/// Splits on `;` outside quotes. Returns `None` for an unterminated quote.
fn split_clauses(instruction: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (index, c) in instruction.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(instruction.get(start..index)?);
                start = index + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return None;
    }
    segments.push(instruction.get(start..)?);
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn splits_plain_packages() {
        assert_eq!(
            split_export_header("com.foo,com.bar"),
            vec!["com.foo", "com.bar"]
        );
    }

    #[test]
    fn keeps_quoted_commas_inside_a_fragment() {
        let header = r#"com.foo;uses:="com.bar,com.baz";version="1.0",com.qux;version="2.0""#;

        assert_eq!(
            split_export_header(header),
            vec![
                r#"com.foo;uses:="com.bar,com.baz";version="1.0""#,
                r#"com.qux;version="2.0""#,
            ]
        );
    }

    #[test]
    fn unquoted_attribute_values_lose_their_package() {
        assert_eq!(
            split_export_header("com.foo,com.bar;version=1.0"),
            vec!["com.foo", "version=1.0"]
        );
    }

    #[test]
    fn empty_header_has_no_fragments() {
        assert!(split_export_header("").is_empty());
    }

    #[rstest]
    #[case::directive(r#"com.foo;uses:="com.bar""#, "com.foo")]
    #[case::attribute_form(r#"com.foo;uses="com.bar""#, "com.foo")]
    #[case::unquoted("com.foo;uses:=com.bar", "com.foo")]
    #[case::keeps_rest(
        r#"com.foo;uses:="com.bar,com.baz";version="1.0""#,
        r#"com.foo;version="1.0""#
    )]
    #[case::untouched(r#"com.foo;version="1.0""#, r#"com.foo;version="1.0""#)]
    fn strips_uses_clauses(#[case] fragment: &str, #[case] expected: &str) {
        assert_eq!(strip_uses(fragment), expected);
    }

    #[test]
    fn marker_is_prepended() {
        assert_eq!(with_marker("com.foo"), "[0-9]?com.foo");
    }

    #[test]
    fn parses_instruction_with_mixed_clauses() {
        let instruction = ExportInstruction::parse(r#"com.foo;uses:="a,b";version="1.0""#)
            .expect("valid instruction");

        assert_eq!(instruction.package(), "com.foo");
        assert_eq!(instruction.clauses().len(), 2);
        assert_eq!(instruction.clause("uses"), Some("\"a,b\""));
        assert_eq!(instruction.clause("version"), Some("\"1.0\""));
        assert!(instruction.clauses().first().is_some_and(|c| c.directive));
    }

    #[test]
    fn display_restores_the_instruction_text() {
        let text = r#"com.foo;uses:="a,b";version="1.0""#;

        let instruction = ExportInstruction::parse(text).expect("valid instruction");

        assert_eq!(instruction.to_string(), text);
    }

    #[test]
    fn without_drops_named_clauses() {
        let instruction = ExportInstruction::parse(r#"com.foo;uses:="a";version="1.0""#)
            .expect("valid instruction")
            .without("uses");

        assert_eq!(instruction.to_string(), r#"com.foo;version="1.0""#);
    }

    #[rstest]
    #[case::blank_package(";version=\"1.0\"")]
    #[case::open_quote("com.foo;version=\"1.0")]
    #[case::bare_clause("com.foo;version")]
    #[case::nameless_clause("com.foo;=1.0")]
    fn rejects_malformed_instructions(#[case] text: &str) {
        assert!(matches!(
            ExportInstruction::parse(text),
            Err(ExportError::Malformed { .. })
        ));
    }
}
