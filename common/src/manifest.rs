//! JAR manifest codec.
//!
//! A manifest is a main section of `Name: value` headers followed by any
//! number of named sections, separated by blank lines. Long values are folded
//! onto continuation lines that start with a single space, and no physical
//! line may exceed 72 bytes. Header names compare case-insensitively.

use std::fmt;

/// Maximum physical line length, in bytes, excluding the line terminator.
const MAX_LINE_BYTES: usize = 72;

/// Longest header name permitted by the JAR specification.
const MAX_NAME_LEN: usize = 70;

/// Header that opens every named section.
const SECTION_NAME: &str = "Name";

/// Header written first in the main section when present.
pub const MANIFEST_VERSION: &str = "Manifest-Version";

/// Errors arising from manifest parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    /// The manifest bytes are not valid UTF-8.
    #[error("manifest is not valid UTF-8")]
    InvalidUtf8,

    /// A line could not be interpreted.
    #[error("malformed manifest at line {line}: {reason}")]
    Malformed {
        /// One-based line number of the offending line.
        line: usize,
        /// Description of the problem.
        reason: String,
    },
}

/// An ordered, case-insensitive set of manifest headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `name`, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|index| self.entries.get(index))
            .map(|(_, value)| value.as_str())
    }

    /// Sets `name` to `value`.
    ///
    /// An existing header keeps its position and original spelling; a new
    /// header is appended.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name).and_then(|index| self.entries.get_mut(index)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Removes `name` and returns its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name)
            .map(|index| self.entries.remove(index).1)
    }

    /// Iterates headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
    }

    fn append_continuation(&mut self, fragment: &str) -> bool {
        match self.entries.last_mut() {
            Some((_, value)) => {
                value.push_str(fragment);
                true
            }
            None => false,
        }
    }
}

/// A named manifest section, usually describing a single entry of the jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Value of the section's `Name` header.
    pub name: String,
    /// Headers following the `Name` header.
    pub attributes: Attributes,
}

/// A parsed JAR manifest.
///
/// # Examples
///
/// ```
/// use packwright_common::manifest::Manifest;
///
/// let manifest = Manifest::parse(b"Manifest-Version: 1.0\r\nExport-Package: com.acme\r\n\r\n")
///     .expect("valid manifest");
/// assert_eq!(manifest.main().get("export-package"), Some("com.acme"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    main: Attributes,
    sections: Vec<Section>,
}

impl Manifest {
    /// Creates an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses manifest bytes.
    ///
    /// Accepts `\r\n`, `\n` and lone `\r` line endings.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidUtf8`] for non UTF-8 input and
    /// [`ManifestError::Malformed`] for lines that are neither headers nor
    /// continuations, for continuations with nothing to continue, and for
    /// sections that do not start with a `Name` header.
    pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ManifestError::InvalidUtf8)?;
        let normalised = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut parser = Parser {
            in_main: true,
            ..Parser::default()
        };
        for (index, line) in normalised.split('\n').enumerate() {
            parser.feed(index + 1, line)?;
        }
        Ok(parser.finish())
    }

    /// Main-section headers.
    #[must_use]
    pub fn main(&self) -> &Attributes {
        &self.main
    }

    /// Mutable access to the main-section headers.
    pub fn main_mut(&mut self) -> &mut Attributes {
        &mut self.main
    }

    /// Named sections in file order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Serialises the manifest with CRLF line endings and 72-byte lines.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(version) = self.main.get(MANIFEST_VERSION) {
            write_header(f, MANIFEST_VERSION, version)?;
        }
        for (name, value) in self.main.iter() {
            if !name.eq_ignore_ascii_case(MANIFEST_VERSION) {
                write_header(f, name, value)?;
            }
        }
        f.write_str("\r\n")?;

        for section in &self.sections {
            write_header(f, SECTION_NAME, &section.name)?;
            for (name, value) in section.attributes.iter() {
                write_header(f, name, value)?;
            }
            f.write_str("\r\n")?;
        }
        Ok(())
    }
}

/// Returns `true` when `name` is a legal manifest header name.
///
/// Legal names are 1 to 70 characters drawn from ASCII letters, digits,
/// `-` and `_`.
///
/// # Examples
///
/// ```
/// use packwright_common::manifest::is_valid_header_name;
///
/// assert!(is_valid_header_name("Bundle-SymbolicName"));
/// assert!(!is_valid_header_name("-exportcontents "));
/// ```
#[must_use]
pub fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Writes one header, folding it onto continuation lines as required.
fn write_header(f: &mut fmt::Formatter<'_>, name: &str, value: &str) -> fmt::Result {
    let line = format!("{name}: {value}");
    let mut budget = MAX_LINE_BYTES;
    let mut used = 0;
    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > budget {
            f.write_str("\r\n ")?;
            budget = MAX_LINE_BYTES - 1;
            used = 0;
        }
        write!(f, "{c}")?;
        used += width;
    }
    f.write_str("\r\n")
}

#[derive(Default)]
struct Parser {
    main: Attributes,
    sections: Vec<Section>,
    current: Option<Section>,
    in_main: bool,
    between_sections: bool,
}

impl Parser {
    fn feed(&mut self, line_number: usize, line: &str) -> Result<(), ManifestError> {
        if line.is_empty() {
            self.close_section();
            return Ok(());
        }

        if let Some(fragment) = line.strip_prefix(' ') {
            return self.continue_header(line_number, fragment);
        }

        let (name, value) = split_header(line_number, line)?;
        if self.in_main {
            self.main.insert(name, value);
        } else if self.between_sections {
            if !name.eq_ignore_ascii_case(SECTION_NAME) {
                return Err(ManifestError::Malformed {
                    line: line_number,
                    reason: format!("section must start with `Name`, found `{name}`"),
                });
            }
            self.between_sections = false;
            self.current = Some(Section {
                name: value.to_owned(),
                attributes: Attributes::new(),
            });
        } else if let Some(section) = self.current.as_mut() {
            section.attributes.insert(name, value);
        }
        Ok(())
    }

    fn continue_header(&mut self, line_number: usize, fragment: &str) -> Result<(), ManifestError> {
        let continued = if self.in_main {
            self.main.append_continuation(fragment)
        } else {
            match self.current.as_mut() {
                // The section name itself may be folded before any attribute.
                Some(section) if section.attributes.is_empty() => {
                    section.name.push_str(fragment);
                    true
                }
                Some(section) => section.attributes.append_continuation(fragment),
                None => false,
            }
        };

        if continued {
            Ok(())
        } else {
            Err(ManifestError::Malformed {
                line: line_number,
                reason: "continuation line without a preceding header".to_owned(),
            })
        }
    }

    fn close_section(&mut self) {
        if let Some(section) = self.current.take() {
            self.sections.push(section);
        }
        self.in_main = false;
        self.between_sections = true;
    }

    fn finish(mut self) -> Manifest {
        self.close_section();
        Manifest {
            main: self.main,
            sections: self.sections,
        }
    }
}

fn split_header(line_number: usize, line: &str) -> Result<(&str, &str), ManifestError> {
    let parsed = line
        .split_once(": ")
        .or_else(|| line.strip_suffix(':').map(|name| (name, "")));
    match parsed {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(ManifestError::Malformed {
            line: line_number,
            reason: format!("expected `Name: value`, found `{line}`"),
        }),
    }
}
