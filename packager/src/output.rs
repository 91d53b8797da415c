//! Output formatting for merged instructions.
//!
//! Instructions are printed either as manifest-style `Header: value` lines
//! for people or as a JSON object for scripts.

use crate::bundle::Problem;
use crate::merge::Instructions;
use std::fmt::Display;
use std::io::Write;

/// Format instructions as `Header: value` lines.
///
/// # Examples
///
/// ```
/// use packwright_packager::merge::Instructions;
/// use packwright_packager::output::format_human;
///
/// let mut instructions = Instructions::new();
/// instructions.insert("Export-Package".to_owned(), "[0-9]?com.acme".to_owned());
/// assert_eq!(format_human(&instructions), "Export-Package: [0-9]?com.acme\n");
/// ```
#[must_use]
pub fn format_human(instructions: &Instructions) -> String {
    instructions
        .iter()
        .map(|(name, value)| format!("{name}: {value}\n"))
        .collect()
}

/// Format instructions as a JSON object keyed by header name.
///
/// # Examples
///
/// ```
/// use packwright_packager::merge::Instructions;
/// use packwright_packager::output::format_json;
///
/// let json = format_json(&Instructions::new());
/// assert_eq!(json, "{}");
/// ```
#[must_use]
pub fn format_json(instructions: &Instructions) -> String {
    serde_json::to_string_pretty(instructions).unwrap_or_else(|_| "{}".to_owned())
}

/// Writes `message` and a newline to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}

/// Writes each problem on its own line, prefixed with `severity`.
pub fn write_problems(stderr: &mut dyn Write, severity: &str, problems: &[Problem]) {
    for problem in problems {
        write_stderr_line(stderr, format!("{severity}: {problem}"));
    }
}
