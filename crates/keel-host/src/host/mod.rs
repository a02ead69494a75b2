//! Service host lifecycle: collection, start, readiness, and teardown.
//!
//! A [`ServiceHost`] moves through [`HostPhase`]s on a single control thread.
//! It discovers `Keel.Service.<name>` declarations in configuration order,
//! loads each service's module, constructs the service through its factory
//! and initialises it. Once every service is registered the host starts them
//! in the same order, announces readiness, and activates its dispatch
//! adapter. After shutdown is requested the host stops every service, again
//! in declaration order, releasing each service before its module.
//!
//! A failure while collecting or starting aborts startup. Every service
//! registered so far is stopped, including services whose `start` never ran,
//! before the failure is returned. A failing `stop` is reported and never
//! interrupts the stop pass.

mod builder;
mod compose;
mod record;

use std::fmt;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use indexmap::IndexMap;
use keel_config::{ADAPTER_NAME, ENDPOINTS_PROPERTY, READY_PROPERTY, SERVICE_PREFIX};
use strum::Display;
use tracing::{debug, info, warn};

use crate::communicator::{Communicator, ObjectAdapter, ShutdownHandle};
use crate::context::HostContext;
use crate::error::{HostError, ModuleError, ServiceError};
use crate::health::HealthReporter;
use crate::module::{EntryPoint, ModuleLoader};

pub use builder::ServiceHostBuilder;
use record::ServiceRecord;

pub(crate) const HOST_TARGET: &str = "keel_host::host";

/// Lifecycle phase of a [`ServiceHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum HostPhase {
    /// Built but not yet started.
    Idle,
    /// Loading and initialising declared services.
    Collecting,
    /// Every declared service is initialised and registered.
    Loaded,
    /// Every registered service has started.
    Started,
    /// The registry has been drained by a stop pass.
    Stopped,
}

/// Outcome of a stop pass.
#[derive(Debug, Default)]
pub struct StopReport {
    stopped: Vec<String>,
    failures: Vec<HostError>,
}

impl StopReport {
    /// Services whose `stop` succeeded, in stop order.
    #[must_use]
    pub fn stopped(&self) -> &[String] {
        &self.stopped
    }

    /// Stop failures, in stop order.
    #[must_use]
    pub fn failures(&self) -> &[HostError] {
        &self.failures
    }

    /// The most recent stop failure.
    #[must_use]
    pub fn last_failure(&self) -> Option<&HostError> {
        self.failures.last()
    }

    /// Returns `true` when every service stopped cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Manages the lifecycle of every configured service.
pub struct ServiceHost {
    communicator: Arc<dyn Communicator>,
    context: HostContext,
    host_options: Vec<String>,
    args: Vec<String>,
    loader: Box<dyn ModuleLoader>,
    reporter: Arc<dyn HealthReporter>,
    ready_stream: Box<dyn Write>,
    adapter: Option<Box<dyn ObjectAdapter>>,
    registry: IndexMap<String, ServiceRecord>,
    phase: HostPhase,
}

impl ServiceHost {
    /// Builds a host with the production loader and reporter.
    ///
    /// `args` are the residual process arguments; options among them scoped
    /// to a service are routed to that service.
    #[must_use]
    pub fn new<I, S>(communicator: Arc<dyn Communicator>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder(communicator).args(args).build()
    }

    /// Starts building a host over `communicator`.
    #[must_use]
    pub fn builder(communicator: Arc<dyn Communicator>) -> ServiceHostBuilder {
        ServiceHostBuilder::new(communicator)
    }

    /// Runs the full lifecycle: start every service, wait for shutdown, then
    /// stop every service.
    ///
    /// # Errors
    ///
    /// Returns the failure that aborted startup, after rolling back. Stop
    /// failures do not fail the run; they are returned in the
    /// [`StopReport`].
    pub fn run(&mut self) -> Result<StopReport, HostError> {
        self.start_all()?;
        info!(
            target: HOST_TARGET,
            services = self.registry.len(),
            "waiting for shutdown"
        );
        self.communicator.wait_for_shutdown();
        let report = self.stop_all();
        if let Some(last) = report.last_failure() {
            warn!(
                target: HOST_TARGET,
                failures = report.failures().len(),
                last = %last,
                "services stopped with failures"
            );
        }
        Ok(report)
    }

    /// Collects and starts every declared service, then announces readiness
    /// and activates dispatch.
    ///
    /// # Errors
    ///
    /// Returns the first load, init, start, adapter, or ready-notice failure.
    /// Every registered service has been stopped by the time it returns.
    /// Returns [`HostError::Lifecycle`], leaving the running services
    /// untouched, unless the host is idle or stopped.
    pub fn start_all(&mut self) -> Result<(), HostError> {
        if !matches!(self.phase, HostPhase::Idle | HostPhase::Stopped) {
            return Err(HostError::Lifecycle { phase: self.phase });
        }
        let Err(error) = self.startup() else {
            return Ok(());
        };
        self.reporter.startup_failed(&error);
        let report = self.stop_all();
        debug!(
            target: HOST_TARGET,
            stopped = report.stopped().len(),
            failed = report.failures().len(),
            "startup rolled back"
        );
        Err(error)
    }

    /// Stops every registered service in registration order and releases it.
    ///
    /// Every service receives a stop attempt; failures are collected into the
    /// report. The registry is empty afterwards.
    pub fn stop_all(&mut self) -> StopReport {
        drop(self.adapter.take());
        let mut report = StopReport::default();
        for (name, mut record) in self.registry.drain(..) {
            let module = record.module_description();
            match guarded(|| record.stop()) {
                Ok(()) => {
                    self.reporter.service_stopped(&name);
                    report.stopped.push(name);
                }
                Err(source) => {
                    let error = HostError::Stop {
                        service: name,
                        source,
                    };
                    self.reporter.service_stop_failed(&error);
                    report.failures.push(error);
                }
            }
            record.release();
            debug!(target: HOST_TARGET, %module, "service module released");
        }
        self.phase = HostPhase::Stopped;
        report
    }

    /// Returns a handle that requests shutdown from any thread.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(Arc::clone(&self.communicator))
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> HostPhase {
        self.phase
    }

    /// Names of the registered services, in registration order.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.registry.keys().map(String::as_str)
    }

    /// Returns the context shared with every service.
    #[must_use]
    pub const fn context(&self) -> &HostContext {
        &self.context
    }

    fn startup(&mut self) -> Result<(), HostError> {
        let mut adapter = self.create_adapter()?;
        self.collect()?;
        self.start_services()?;
        self.announce_ready()?;
        adapter
            .activate()
            .map_err(|source| HostError::Adapter { source })?;
        self.adapter = Some(adapter);
        Ok(())
    }

    fn create_adapter(&self) -> Result<Box<dyn ObjectAdapter>, HostError> {
        let endpoints = self
            .communicator
            .properties()
            .get_or(ENDPOINTS_PROPERTY, "");
        self.communicator
            .create_adapter(ADAPTER_NAME, endpoints)
            .map_err(|source| HostError::Adapter { source })
    }

    fn collect(&mut self) -> Result<(), HostError> {
        self.phase = HostPhase::Collecting;
        let declarations: Vec<(String, String)> = self
            .communicator
            .properties()
            .with_prefix(SERVICE_PREFIX)
            .map(|(key, value)| {
                let name = key.strip_prefix(SERVICE_PREFIX).unwrap_or(key);
                (name.to_owned(), value.to_owned())
            })
            .collect();
        self.reporter.collection_starting(declarations.len());
        for (name, declaration) in &declarations {
            self.load_service(name, declaration)?;
        }
        self.phase = HostPhase::Loaded;
        Ok(())
    }

    fn load_service(&mut self, name: &str, declaration: &str) -> Result<(), HostError> {
        let (entry_text, declared) = compose::split_declaration(declaration);
        let load_failure = |source: ModuleError| HostError::Load {
            service: name.to_owned(),
            entry_point: entry_text.to_owned(),
            source,
        };
        let entry = EntryPoint::parse(entry_text).map_err(load_failure)?;
        let composed =
            compose::compose_arguments(name, &self.host_options, &declared, &self.args);
        let (properties, args) = compose::service_properties(name, composed);

        let module = self.loader.load(&entry).map_err(load_failure)?;
        let factory = module.factory(entry.symbol()).map_err(load_failure)?;
        self.reporter.service_loaded(name, &module.describe());

        let init_failure = |source: ServiceError| HostError::Init {
            service: name.to_owned(),
            source,
        };
        let mut service = guarded(|| factory.create(&self.context)).map_err(init_failure)?;
        drop(factory);
        if let Err(source) = guarded(|| service.init(name, &self.context, &properties, &args)) {
            drop(service);
            drop(module);
            return Err(init_failure(source));
        }
        self.registry
            .insert(name.to_owned(), ServiceRecord::new(service, module));
        self.reporter.service_initialized(name);
        Ok(())
    }

    fn start_services(&mut self) -> Result<(), HostError> {
        for (name, record) in &mut self.registry {
            guarded(|| record.start()).map_err(|source| HostError::Start {
                service: name.clone(),
                source,
            })?;
            self.reporter.service_started(name);
        }
        self.phase = HostPhase::Started;
        self.reporter.services_ready(self.registry.len());
        Ok(())
    }

    fn announce_ready(&mut self) -> Result<(), HostError> {
        let marker = self.communicator.properties().get_or(READY_PROPERTY, "");
        if marker.is_empty() {
            return Ok(());
        }
        writeln!(self.ready_stream, "{marker} ready")
            .and_then(|()| self.ready_stream.flush())
            .map_err(|source| HostError::ReadyNotice {
                marker: marker.to_owned(),
                source,
            })
    }
}

impl fmt::Debug for ServiceHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHost")
            .field("phase", &self.phase)
            .field("services", &self.registry.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Runs plugin code, converting a panic into a [`ServiceError`].
///
/// Errors come back detached, so none of their code outlives the module.
fn guarded<T>(call: impl FnOnce() -> Result<T, ServiceError>) -> Result<T, ServiceError> {
    panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(ServiceError::from_panic(payload.as_ref())))
        .map_err(ServiceError::detach)
}
