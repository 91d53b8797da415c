//! A self-contained [`BundleTool`] that stamps instructions into the jar manifest.
//!
//! The stamper copies every entry of the input jar to the output and rewrites
//! the manifest's main section from the instructions. `Export-Package` is
//! resolved against the packages the jar contains, the way bundling tools
//! interpret it:
//!
//! - instructions are tried in order and the first pattern matching a package
//!   decides its fate; `!` negates;
//! - `*` matches any run of characters and a trailing `.*` also matches the
//!   package itself; other regex syntax (such as `[0-9]?`) is honoured;
//! - an instruction without any pattern syntax is a literal and is exported
//!   unconditionally, even over an earlier negation.
//!
//! Instruction names starting with `-` are tool directives and are not copied
//! into the manifest.

use crate::archive::{JarFile, MANIFEST_PATH};
use crate::bundle::{BundleError, BundleReport, BundleTool, Problem};
use crate::merge::Instructions;
use log::debug;
use packwright_common::export::{EXPORT_PACKAGE, ExportInstruction, split_export_header};
use packwright_common::manifest::{MANIFEST_VERSION, Manifest, is_valid_header_name};
use regex::Regex;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Manifest header naming the bundle.
pub const BUNDLE_SYMBOLIC_NAME: &str = "Bundle-SymbolicName";

/// Manifest header selecting the OSGi manifest syntax version.
pub const BUNDLE_MANIFEST_VERSION: &str = "Bundle-ManifestVersion";

/// Characters that turn an instruction into a pattern.
const PATTERN_CHARS: &[char] = &['*', '?', '[', ']', '(', ')', '|', '+', '{', '}', '\\', '^'];

/// Writes bundling instructions straight into the jar manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestStamper;

impl BundleTool for ManifestStamper {
    fn build(
        &self,
        input: &Path,
        instructions: &Instructions,
        output: &Path,
    ) -> Result<BundleReport, BundleError> {
        let mut jar = JarFile::open(input)?;
        let mut manifest = jar.manifest()?.unwrap_or_default();
        let mut report = BundleReport::default();

        for (name, value) in instructions {
            if name.starts_with('-') {
                debug!("skipping tool directive {name}");
            } else if !is_valid_header_name(name) {
                report
                    .errors
                    .push(Problem::new(format!("invalid manifest header name `{name}`")));
            } else if name != EXPORT_PACKAGE {
                manifest.main_mut().insert(name.as_str(), value.as_str());
            }
        }

        if let Some(value) = instructions.get(EXPORT_PACKAGE) {
            let packages = jar.exportable_packages();
            let exports = resolve_exports(value, &packages, &mut report);
            if exports.is_empty() {
                manifest.main_mut().remove(EXPORT_PACKAGE);
                report
                    .warnings
                    .push(Problem::new("Export-Package matches no packages"));
            } else {
                manifest.main_mut().insert(EXPORT_PACKAGE, exports.join(","));
            }
        }

        check_symbolic_name(&manifest, &mut report);
        apply_defaults(&mut manifest);
        write_bundle(&mut jar, &manifest, output)?;
        Ok(report)
    }
}

fn check_symbolic_name(manifest: &Manifest, report: &mut BundleReport) {
    match manifest.main().get(BUNDLE_SYMBOLIC_NAME) {
        Some(name) if name.trim().is_empty() => report
            .errors
            .push(Problem::new("Bundle-SymbolicName must not be blank")),
        Some(_) => {}
        None => report
            .warnings
            .push(Problem::new("Bundle-SymbolicName is not set")),
    }
}

fn apply_defaults(manifest: &mut Manifest) {
    let main = manifest.main_mut();
    if main.get(MANIFEST_VERSION).is_none() {
        main.insert(MANIFEST_VERSION, "1.0");
    }
    if main.get(BUNDLE_MANIFEST_VERSION).is_none() {
        main.insert(BUNDLE_MANIFEST_VERSION, "2");
    }
}

/// Copies every entry except the old manifest and writes `manifest` first.
///
/// The bundle is staged next to `output` and only replaces it once complete.
fn write_bundle(jar: &mut JarFile, manifest: &Manifest, output: &Path) -> Result<(), BundleError> {
    let old_manifest = jar.manifest_entry();
    let staging_dir = output
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut writer = ZipWriter::new(NamedTempFile::new_in(staging_dir)?);
    writer.start_file(MANIFEST_PATH, SimpleFileOptions::default())?;
    writer.write_all(&manifest.to_bytes())?;

    let archive = jar.archive_mut();
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if old_manifest.as_deref() == Some(entry.name()) {
            continue;
        }
        writer.raw_copy_file(entry)?;
    }
    let staged = writer.finish()?;
    staged.persist(output).map_err(|error| error.error)?;
    debug!("wrote bundle {}", output.display());
    Ok(())
}

struct ExportRule {
    instruction: ExportInstruction,
    negated: bool,
    matcher: Option<Regex>,
    used: bool,
}

impl ExportRule {
    fn parse(fragment: &str) -> Result<Self, String> {
        let instruction = ExportInstruction::parse(fragment).map_err(|e| e.to_string())?;
        let (negated, body) = match instruction.package().strip_prefix('!') {
            Some(body) => (true, body.to_owned()),
            None => (false, instruction.package().to_owned()),
        };

        let matcher = if body.contains(PATTERN_CHARS) || negated {
            let regex = pattern_regex(&body);
            Some(Regex::new(&regex).map_err(|e| format!("invalid pattern `{body}`: {e}"))?)
        } else {
            None
        };

        Ok(Self {
            instruction: instruction.for_package(&body),
            negated,
            matcher,
            used: false,
        })
    }

    fn matches(&self, package: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|matcher| matcher.is_match(package))
    }

    fn export(&self, package: &str) -> String {
        self.instruction.for_package(package).without("uses").to_string()
    }
}

/// Translates an instruction pattern into an anchored regex.
fn pattern_regex(body: &str) -> String {
    let (base, subpackages) = match body.strip_suffix(".*") {
        Some(base) => (base, true),
        None => (body, false),
    };

    let mut regex = String::from("^");
    for c in base.chars() {
        match c {
            '.' => regex.push_str(r"\."),
            '*' => regex.push_str(".*"),
            '$' => regex.push_str(r"\$"),
            other => regex.push(other),
        }
    }
    if subpackages {
        regex.push_str(r"(\..*)?");
    }
    regex.push('$');
    regex
}

/// Resolves an `Export-Package` instruction list against `packages`.
fn resolve_exports(value: &str, packages: &[String], report: &mut BundleReport) -> Vec<String> {
    let mut rules: Vec<ExportRule> = Vec::new();
    for fragment in split_export_header(value) {
        match ExportRule::parse(fragment.trim()) {
            Ok(rule) => rules.push(rule),
            Err(reason) => report.errors.push(Problem::new(reason)),
        }
    }

    let mut exports = Vec::new();
    let mut exported = BTreeSet::new();
    for package in packages {
        let Some(rule) = rules.iter_mut().find(|rule| rule.matches(package)) else {
            continue;
        };
        rule.used = true;
        if !rule.negated {
            exports.push(rule.export(package));
            exported.insert(package.clone());
        }
    }

    for rule in &rules {
        if rule.matcher.is_none() {
            let package = rule.instruction.package();
            if !packages.iter().any(|candidate| candidate == package) {
                report.warnings.push(Problem::new(format!(
                    "exported package {package} is not contained in the jar"
                )));
            }
            if exported.insert(package.to_owned()) {
                exports.push(rule.export(package));
            }
        } else if !rule.used && !rule.negated {
            report.warnings.push(Problem::new(format!(
                "unused Export-Package instruction {}",
                rule.instruction
            )));
        }
    }

    exports
}
