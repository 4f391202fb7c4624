//! linesweep entry point.

use clap::Parser;
use linesweep::{
    cli::{normalize_legacy_args, Cli},
    error::ExitCode,
    logging::init_logging,
};

fn main() {
    let cli = match Cli::try_parse_from(normalize_legacy_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are reported as errors by clap but exit 0.
            let code = if err.use_stderr() {
                ExitCode::GeneralError
            } else {
                ExitCode::Success
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    if let Err(err) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {err}");
    }

    match linesweep::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::GeneralError;
            eprintln!("[{}] Error: {}", exit_code.code_prefix(), err);
            std::process::exit(exit_code.as_i32());
        }
    }
}
