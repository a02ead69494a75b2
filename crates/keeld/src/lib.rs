//! Process entry point for the Keel service host.
//!
//! `keeld` loads property files, initialises structured telemetry, hosts
//! every declared service through [`keel_host::ServiceHost`], and stops the
//! services again when the process receives a termination signal.
//!
//! Property files hold one `key = value` assignment per line. Services are
//! declared as `Keel.Service.<name> = <library>[:<symbol>] [args...]`, and
//! `Keel.PrintServicesReady = <marker>` prints `<marker> ready` once every
//! service has started.

mod cli;
mod process;
mod telemetry;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

pub use cli::Cli;
pub use process::{
    LaunchError, ShutdownError, ShutdownListener, ShutdownSignal, SystemShutdownSignal, run_host,
};
pub use telemetry::{TelemetryError, TelemetryHandle};

use process::PROCESS_TARGET;

/// Parses the command line, runs the host, and maps the outcome to an exit
/// code.
#[must_use]
pub fn run_from_env() -> ExitCode {
    let cli = Cli::parse();
    match run_host(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            report_failure(&failure);
            ExitCode::FAILURE
        }
    }
}

fn report_failure(failure: &LaunchError) {
    if telemetry::is_initialised() {
        error!(target: PROCESS_TARGET, error = %failure, "service host failed");
    } else {
        writeln!(io::stderr().lock(), "keeld: {failure}").unwrap_or_default();
    }
}
