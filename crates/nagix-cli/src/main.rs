//! Entry point for the `nagix` command.
//!
//! The binary delegates to [`nagix_cli::run`], which loads configuration,
//! installs telemetry and runs one query or command against Livestatus.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    nagix_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
