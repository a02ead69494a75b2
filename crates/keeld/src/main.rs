//! `keeld` binary: hosts the services declared in Keel property files.

use std::process::ExitCode;

fn main() -> ExitCode {
    keeld::run_from_env()
}
