//! `packwright` CLI entrypoint.
//!
//! Loads the packaging descriptor and either prints the merged bundling
//! instructions or stamps them into a packaged jar.

use clap::Parser;
use packwright_packager::cli::{Cli, Command};
use packwright_packager::error::Result;
use packwright_packager::output::write_stderr_line;
use packwright_packager::pipeline::{Reporting, run_bundle, run_merge};
use packwright_packager::stamper::ManifestStamper;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let reporting = Reporting {
        verbosity: cli.verbosity,
        quiet: cli.quiet,
    };

    match &cli.command {
        Command::Merge(args) => run_merge(args, reporting, stdout, stderr),
        Command::Bundle(args) => run_bundle(args, &ManifestStamper, reporting, stderr).map(|_| ()),
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packwright_packager::error::PackagerError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = PackagerError::WriteFailed {
            source: std::io::Error::other("broken pipe"),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("failed to write output"));
    }

    #[test]
    fn run_reports_missing_descriptors() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = dir.path().join("absent.toml");
        let cli = Cli::parse_from([
            "packwright",
            "merge",
            "--config",
            config.to_str().expect("UTF-8 temp path"),
        ]);

        let result = run(&cli, &mut Vec::new(), &mut Vec::new());

        assert!(matches!(result, Err(PackagerError::Config(_))));
    }
}
