//! Command orchestration.
//!
//! Each command loads the packaging descriptor, validates it into a
//! [`PackagingPlan`], and runs the merger or the bundle step. Progress goes to
//! the injected `stderr`; results go to `stdout`.

use crate::bundle::{BundleError, BundleOutcome, BundleRequest, BundleTool, build_bundle};
use crate::cli::{BundleArgs, MergeArgs};
use crate::error::{PackagerError, Result};
use crate::merge::{Instructions, merge_instructions};
use crate::output::{format_human, format_json, write_problems, write_stderr_line};
use crate::plan::PackagingPlan;
use camino::Utf8Path;
use packwright::PackagingConfig;
use std::io::Write;

/// Output settings shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporting {
    /// Verbosity level.
    pub verbosity: u8,
    /// Suppress progress output.
    pub quiet: bool,
}

/// Loads and validates the descriptor at `config`.
///
/// # Errors
///
/// Returns an error if the descriptor cannot be read, parsed, or validated.
pub fn load_plan(config: &Utf8Path) -> Result<PackagingPlan> {
    let config = PackagingConfig::load(config)?;
    PackagingPlan::from_config(&config)
}

/// Computes the merged instructions of the plan.
///
/// # Errors
///
/// Returns an error if any artifact cannot be merged.
pub fn merged_instructions(plan: &PackagingPlan) -> Result<Instructions> {
    Ok(merge_instructions(
        &plan.instructions,
        &plan.artifacts,
        &plan.relocations,
    )?)
}

/// Runs `packwright merge`.
///
/// # Errors
///
/// Returns an error if the plan cannot be loaded or merged, or if writing
/// to `stdout` fails.
pub fn run_merge(
    args: &MergeArgs,
    reporting: Reporting,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let plan = load_plan(&args.config)?;
    if reporting.verbosity > 0 {
        write_stderr_line(
            stderr,
            format!(
                "Merging exports of {} artifact(s) from {}",
                plan.artifacts.len(),
                args.config
            ),
        );
    }

    let merged = merged_instructions(&plan)?;
    let rendered = if args.json {
        format!("{}\n", format_json(&merged))
    } else {
        format_human(&merged)
    };
    stdout
        .write_all(rendered.as_bytes())
        .map_err(|source| PackagerError::WriteFailed { source })
}

/// Runs `packwright bundle` with `tool`.
///
/// Warnings are written to `stderr` unless quiet; errors reported by the tool
/// are always written before the failure is returned.
///
/// # Errors
///
/// Returns an error if the plan cannot be loaded or the bundle step fails.
pub fn run_bundle(
    args: &BundleArgs,
    tool: &dyn BundleTool,
    reporting: Reporting,
    stderr: &mut dyn Write,
) -> Result<BundleOutcome> {
    let plan = load_plan(&args.config)?;
    let request = BundleRequest {
        jar: args.jar.as_std_path(),
        instructions: &plan.instructions,
        artifacts: &plan.artifacts,
        relocations: &plan.relocations,
        enabled: plan.enabled,
    };

    let outcome = match build_bundle(tool, &request) {
        Ok(outcome) => outcome,
        Err(error) => {
            if let BundleError::Invalid { errors, .. } = &error {
                write_problems(stderr, "error", errors);
            }
            return Err(error.into());
        }
    };

    match &outcome {
        BundleOutcome::Skipped => {
            if !reporting.quiet {
                write_stderr_line(stderr, format!("Bundling disabled; {} left as is.", args.jar));
            }
        }
        BundleOutcome::Built {
            instructions,
            warnings,
        } => {
            if !reporting.quiet {
                write_problems(stderr, "warning", warnings);
                write_stderr_line(stderr, format!("Bundled {}", args.jar));
            }
            if reporting.verbosity > 0 {
                write_stderr_line(stderr, format_human(instructions).trim_end());
            }
        }
    }
    Ok(outcome)
}
