//! Host process supervision: configuration, signals, and the host run.

mod errors;
mod launch;
mod shutdown;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

pub use errors::LaunchError;
#[cfg(test)]
pub(crate) use launch::{LaunchPlan, ServiceDeps, run_host_with};
pub use launch::run_host;
pub use shutdown::{ShutdownError, ShutdownListener, ShutdownSignal, SystemShutdownSignal};
