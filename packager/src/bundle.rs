//! The bundle step of a packaging run.
//!
//! Once the packaged jar has been assembled, the bundle step merges the
//! bundling instructions, hands a working copy of the jar to a
//! [`BundleTool`], and writes the tool's output over the original jar. A tool
//! that reports errors fails the step: the output jar is deleted rather than
//! left behind with a wrong manifest, and every error is logged with its
//! source location when the tool knows one.

use crate::archive::JarError;
use crate::merge::{Instructions, MergeError, SourceArtifact, merge_instructions};
use crate::relocation::Relocations;
use log::{Level, debug, log};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::result::ZipError;

/// Errors arising from the bundle step.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The bundling tool reported errors; the output jar has been deleted.
    #[error("Bundle {name} has errors")]
    Invalid {
        /// File name of the rejected jar.
        name: String,
        /// The errors reported by the tool.
        errors: Vec<Problem>,
    },

    /// The jar path has no file name component.
    #[error("jar path has no file name: {}", .0.display())]
    InvalidJarPath(PathBuf),

    /// Instruction merging failed.
    #[error("error building bundle: {0}")]
    Merge(#[from] MergeError),

    /// The input jar could not be read.
    #[error("error building bundle: {0}")]
    Jar(#[from] JarError),

    /// Writing the output archive failed.
    #[error("error building bundle: {0}")]
    Zip(#[from] ZipError),

    /// A file system operation failed.
    #[error("I/O error during bundling: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a reported problem originates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// File the problem was found in.
    pub file: PathBuf,
    /// One-based line number.
    pub line: usize,
}

/// A single error or warning reported by a [`BundleTool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// Human-readable description.
    pub message: String,
    /// Source location, when the tool knows one.
    pub location: Option<Location>,
}

impl Problem {
    /// A problem without a source location.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// A problem found at `file:line`.
    #[must_use]
    pub fn at(message: impl Into<String>, file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            message: message.into(),
            location: Some(Location {
                file: file.into(),
                line,
            }),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(
                f,
                "{}:{}: {}",
                location.file.display(),
                location.line,
                self.message
            ),
            None => f.write_str(&self.message),
        }
    }
}

/// Errors and warnings produced while building a bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleReport {
    /// Problems that make the bundle unusable.
    pub errors: Vec<Problem>,
    /// Problems worth reporting that do not fail the build.
    pub warnings: Vec<Problem>,
}

impl BundleReport {
    /// Returns `true` when no errors were reported.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A tool that turns a jar plus instructions into an OSGi bundle.
#[cfg_attr(test, mockall::automock)]
pub trait BundleTool {
    /// Builds the bundle for `input` and writes it to `output`.
    ///
    /// Problems with the instructions or the jar contents belong in the
    /// returned report; `Err` is reserved for failures to run at all.
    ///
    /// # Errors
    ///
    /// Returns a [`BundleError`] if the tool cannot read `input` or write
    /// `output`.
    fn build(
        &self,
        input: &Path,
        instructions: &Instructions,
        output: &Path,
    ) -> Result<BundleReport, BundleError>;
}

/// Inputs of the bundle step.
#[derive(Debug, Clone, Copy)]
pub struct BundleRequest<'a> {
    /// The assembled jar; rewritten in place.
    pub jar: &'a Path,
    /// Instructions configured by the packaging author.
    pub instructions: &'a Instructions,
    /// The artifacts packaged into the jar.
    pub artifacts: &'a [SourceArtifact],
    /// Relocations applied while packaging.
    pub relocations: &'a Relocations,
    /// When `false` the step does nothing.
    pub enabled: bool,
}

/// Result of a successful bundle step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleOutcome {
    /// Bundling is disabled for this jar.
    Skipped,
    /// The jar was rewritten as a bundle.
    Built {
        /// The merged instructions handed to the tool.
        instructions: Instructions,
        /// Warnings reported by the tool.
        warnings: Vec<Problem>,
    },
}

/// Runs the bundle step.
///
/// # Errors
///
/// Returns [`BundleError::Invalid`] after deleting the jar when the tool
/// reports errors, and the other [`BundleError`] variants when merging,
/// copying, or running the tool fails.
pub fn build_bundle(
    tool: &dyn BundleTool,
    request: &BundleRequest<'_>,
) -> Result<BundleOutcome, BundleError> {
    if !request.enabled {
        debug!("bundling disabled for {}", request.jar.display());
        return Ok(BundleOutcome::Skipped);
    }

    let name = request
        .jar
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| BundleError::InvalidJarPath(request.jar.to_path_buf()))?;

    let instructions =
        merge_instructions(request.instructions, request.artifacts, request.relocations)?;

    let work_dir = tempfile::tempdir()?;
    let working_copy = work_dir.path().join(&name);
    fs::copy(request.jar, &working_copy)?;

    let report = tool.build(&working_copy, &instructions, request.jar)?;

    for warning in &report.warnings {
        log_problem(warning, Level::Warn);
    }

    if !report.is_ok() {
        if request.jar.exists() {
            fs::remove_file(request.jar)?;
        }
        for problem in &report.errors {
            log_problem(problem, Level::Error);
        }
        return Err(BundleError::Invalid {
            name,
            errors: report.errors,
        });
    }

    Ok(BundleOutcome::Built {
        instructions,
        warnings: report.warnings,
    })
}

fn log_problem(problem: &Problem, level: Level) {
    let severity = if level == Level::Error { "error" } else { "warning" };
    match &problem.location {
        Some(location) => log!(
            level,
            "{}:{}: {severity}: {}",
            location.file.display(),
            location.line,
            problem.message
        ),
        None => log!(level, "{severity}  : {}", problem.message),
    }
}
