//! CLI argument definitions for `packwright`.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use packwright::DEFAULT_CONFIG_FILE;

/// Merge OSGi bundling instructions for shaded jars.
#[derive(Parser, Debug)]
#[command(name = "packwright")]
#[command(version, about)]
#[command(long_about = concat!(
    "Merge OSGi bundling instructions for shaded jars.\n\n",
    "packwright reads a packaging descriptor listing the artifacts packaged into ",
    "a jar and the relocations applied to them, and computes the Export-Package ",
    "instruction the bundled jar needs. The bundle command stamps the result ",
    "into the jar's manifest.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Print the merged instructions:\n",
    "    $ packwright merge\n\n",
    "  Print them as JSON:\n",
    "    $ packwright merge --json\n\n",
    "  Stamp the instructions into a packaged jar:\n",
    "    $ packwright bundle --jar build/libs/acme-all.jar\n",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet",
        global = true
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity", global = true)]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the merged bundling instructions.
    Merge(MergeArgs),

    /// Rewrite a packaged jar as an OSGi bundle.
    Bundle(BundleArgs),
}

/// Arguments for the merge command.
#[derive(Args, Debug, Clone)]
pub struct MergeArgs {
    /// Packaging descriptor to read.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: Utf8PathBuf,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the bundle command.
#[derive(Args, Debug, Clone)]
pub struct BundleArgs {
    /// Packaging descriptor to read.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: Utf8PathBuf,

    /// The packaged jar; rewritten in place.
    #[arg(long, value_name = "FILE")]
    pub jar: Utf8PathBuf,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
