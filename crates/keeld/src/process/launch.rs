//! Supervises host launch sequencing and runtime orchestration.

use std::io::{self, Write};
use std::sync::Arc;

use keel_host::{
    HealthReporter, LibraryLoader, LocalCommunicator, ModuleLoader, ServiceHost,
    StructuredHealthReporter,
};
use tracing::info;

use crate::cli::Cli;
use crate::telemetry;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Service dependencies required to construct the host.
pub(crate) struct ServiceDeps {
    pub(crate) loader: Box<dyn ModuleLoader>,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) ready_stream: Box<dyn Write>,
}

/// Collaborators required to launch the host.
pub(crate) struct LaunchPlan<S> {
    pub(crate) settings: Cli,
    pub(crate) shutdown: S,
    pub(crate) services: ServiceDeps,
}

/// Runs the host using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when telemetry, configuration, the signal
/// listener, or service startup fails.
pub fn run_host(settings: Cli) -> Result<(), LaunchError> {
    telemetry::initialise(&settings.log_filter, settings.log_format)?;
    let plan = LaunchPlan {
        settings,
        shutdown: SystemShutdownSignal::new(),
        services: ServiceDeps {
            loader: Box::new(LibraryLoader::new()),
            reporter: Arc::new(StructuredHealthReporter::new()),
            ready_stream: Box::new(io::stdout()),
        },
    };
    run_host_with(plan)
}

/// Runs the host with injected collaborators.
pub(crate) fn run_host_with<S>(plan: LaunchPlan<S>) -> Result<(), LaunchError>
where
    S: ShutdownSignal,
{
    let LaunchPlan {
        settings,
        shutdown,
        services,
    } = plan;
    let ServiceDeps {
        loader,
        reporter,
        ready_stream,
    } = services;

    let properties = settings.load_properties()?;
    info!(
        target: PROCESS_TARGET,
        files = settings.config.len(),
        properties = properties.len(),
        "starting service host"
    );
    let communicator = Arc::new(LocalCommunicator::new(properties));
    let mut host = ServiceHost::builder(communicator)
        .args(settings.args)
        .loader(loader)
        .reporter(reporter)
        .ready_stream(ready_stream)
        .build();

    let listener = shutdown.listen(host.shutdown_handle())?;
    let outcome = host.run();
    listener.close();
    let report = outcome?;
    info!(
        target: PROCESS_TARGET,
        stopped = report.stopped().len(),
        stop_failures = report.failures().len(),
        "shutdown sequence completed"
    );
    Ok(())
}
