//! Defines the unified error surface for launching the host process.

use keel_config::ConfigError;
use keel_host::HostError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the host.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[from]
        source: ConfigError,
    },
    /// Telemetry could not be initialised.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[from]
        source: TelemetryError,
    },
    /// The shutdown listener could not be installed.
    #[error("failed to install shutdown listener: {source}")]
    Shutdown {
        /// Underlying listener error.
        #[from]
        source: ShutdownError,
    },
    /// Startup aborted.
    #[error("{source}")]
    Host {
        /// Failure reported by the service host.
        #[from]
        source: HostError,
    },
}
