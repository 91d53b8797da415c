//! OSGi `Export-Package` merging and bundle stamping for shaded jars.
//!
//! A shaded jar bundles several artifacts and usually relocates their
//! packages. This crate works out which packages the resulting OSGi bundle
//! should export and can stamp that decision into the jar's manifest. It is
//! used by the `packwright` CLI binary and can be consumed programmatically by
//! build tooling.
//!
//! # Modules
//!
//! - [`archive`] - Read access to jar archives and their manifests
//! - [`bundle`] - The bundle step and the [`bundle::BundleTool`] seam
//! - [`cli`] - Command-line argument definitions
//! - [`error`] - Top-level error type for the CLI
//! - [`identity`] - Component identities of packaged artifacts
//! - [`merge`] - The `Export-Package` instruction merger
//! - [`output`] - Human and JSON output formatting
//! - [`pipeline`] - Command orchestration
//! - [`plan`] - Validation of packaging descriptors
//! - [`relocation`] - Package relocation rules
//! - [`stamper`] - Built-in manifest-stamping bundle tool

pub mod archive;
pub mod bundle;
pub mod cli;
pub mod error;
pub mod identity;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod plan;
pub mod relocation;
pub mod stamper;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
