//! Recording collaborators shared by the host test suites.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use keel_config::{Properties, READY_PROPERTY, SERVICE_PREFIX};

use crate::communicator::{Communicator, LocalCommunicator, ObjectAdapter, ShutdownHandle};
use crate::context::HostContext;
use crate::error::{CommunicatorError, FailureKind, HostError, ModuleError, ServiceError};
use crate::health::HealthReporter;
use crate::host::{ServiceHost, StopReport};
use crate::module::{DEFAULT_FACTORY_SYMBOL, DynamicModule, EntryPoint, ModuleLoader, ServiceFactory};
use crate::service::Service;

/// Alternative factory symbol exported by every stub module.
pub const ALTERNATE_SYMBOL: &str = "create";

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Arguments observed by a stub service's `init`.
#[derive(Debug, Clone)]
pub struct InitRecord {
    pub name: String,
    pub properties: Properties,
    pub args: Vec<String>,
}

/// Ordered record of every call made against stub collaborators.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    events: Arc<Mutex<Vec<String>>>,
    inits: Arc<Mutex<Vec<InitRecord>>>,
}

impl CallLog {
    pub fn record(&self, event: impl Into<String>) {
        locked(&self.events).push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        locked(&self.events).clone()
    }

    /// Lifecycle calls and ready lines, ignoring loads and releases.
    pub fn lifecycle(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| {
                event == "ready"
                    || event.ends_with(".init")
                    || event.ends_with(".start")
                    || event.ends_with(".stop")
            })
            .collect()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        locked(&self.events).iter().position(|entry| entry == event)
    }

    pub fn contains(&self, event: &str) -> bool {
        self.position(event).is_some()
    }

    fn record_init(&self, record: InitRecord) {
        locked(&self.inits).push(record);
    }

    pub fn init_of(&self, name: &str) -> Option<InitRecord> {
        locked(&self.inits)
            .iter()
            .find(|record| record.name == name)
            .cloned()
    }
}

/// Failure injection for a stub service library.
#[derive(Debug, Clone, Copy, Default)]
pub struct Behaviour {
    pub fail_factory: bool,
    pub panic_factory: bool,
    pub fail_init: bool,
    pub fail_start: bool,
    pub panic_start: bool,
    pub fail_stop: bool,
    pub panic_stop: bool,
    pub request_shutdown_on_start: bool,
    pub attach_cause: bool,
}

/// Cause that records when it is dropped.
#[derive(Debug, thiserror::Error)]
#[error("{label} internal fault")]
struct TrackedCause {
    label: String,
    log: CallLog,
}

impl Drop for TrackedCause {
    fn drop(&mut self) {
        self.log.record(format!("{}.cause.drop", self.label));
    }
}

/// Service that records its lifecycle calls and its release.
struct StubService {
    label: String,
    behaviour: Behaviour,
    log: CallLog,
    shutdown: Option<ShutdownHandle>,
}

impl StubService {
    fn failure(&self, message: &str) -> ServiceError {
        if !self.behaviour.attach_cause {
            return ServiceError::new(message);
        }
        ServiceError::with_source(
            message,
            TrackedCause {
                label: self.label.clone(),
                log: self.log.clone(),
            },
        )
    }
}

impl Service for StubService {
    fn init(
        &mut self,
        name: &str,
        context: &HostContext,
        properties: &Properties,
        args: &[String],
    ) -> Result<(), ServiceError> {
        name.clone_into(&mut self.label);
        self.log.record(format!("{name}.init"));
        self.log.record_init(InitRecord {
            name: name.to_owned(),
            properties: properties.clone(),
            args: args.to_vec(),
        });
        self.shutdown = Some(context.shutdown_handle());
        if self.behaviour.fail_init {
            return Err(self.failure("init refused"));
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), ServiceError> {
        self.log.record(format!("{}.start", self.label));
        if self.behaviour.panic_start {
            panic!("start exploded");
        }
        if self.behaviour.fail_start {
            return Err(self.failure("start refused"));
        }
        let requests_shutdown = self.behaviour.request_shutdown_on_start;
        if let Some(handle) = self.shutdown.as_ref().filter(|_| requests_shutdown) {
            handle.request();
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ServiceError> {
        self.log.record(format!("{}.stop", self.label));
        if self.behaviour.panic_stop {
            panic!("stop exploded");
        }
        if self.behaviour.fail_stop {
            return Err(self.failure("stop refused"));
        }
        Ok(())
    }
}

impl Drop for StubService {
    fn drop(&mut self) {
        self.log.record(format!("{}.release", self.label));
    }
}

/// Module whose factories build [`StubService`]s.
struct StubModule {
    library: String,
    behaviour: Behaviour,
    log: CallLog,
}

impl DynamicModule for StubModule {
    fn factory(&self, symbol: &str) -> Result<ServiceFactory, ModuleError> {
        if symbol != DEFAULT_FACTORY_SYMBOL && symbol != ALTERNATE_SYMBOL {
            return Err(ModuleError::Symbol {
                symbol: symbol.to_owned(),
                diagnostic: format!("undefined symbol: {symbol}"),
            });
        }
        let label = self.library.clone();
        let behaviour = self.behaviour;
        let log = self.log.clone();
        Ok(ServiceFactory::new(move |_context: &HostContext| {
            if behaviour.panic_factory {
                panic!("factory exploded");
            }
            if behaviour.fail_factory {
                return Err(ServiceError::new("factory refused"));
            }
            Ok(Box::new(StubService {
                label: label.clone(),
                behaviour,
                log: log.clone(),
                shutdown: None,
            }) as Box<dyn Service>)
        }))
    }

    fn describe(&self) -> String {
        format!("stub:{}", self.library)
    }
}

impl Drop for StubModule {
    fn drop(&mut self) {
        self.log.record(format!("{}.unload", self.library));
    }
}

/// Loader serving [`StubModule`]s for registered libraries.
#[derive(Debug, Clone, Default)]
pub struct StubLoader {
    libraries: Arc<Mutex<HashMap<String, Behaviour>>>,
    log: CallLog,
}

impl StubLoader {
    pub fn new(log: CallLog) -> Self {
        Self {
            libraries: Arc::default(),
            log,
        }
    }

    pub fn register(&self, library: &str) {
        locked(&self.libraries)
            .entry(library.to_owned())
            .or_default();
    }

    pub fn configure(&self, library: &str, change: impl FnOnce(&mut Behaviour)) {
        change(
            locked(&self.libraries)
                .entry(library.to_owned())
                .or_default(),
        );
    }
}

impl ModuleLoader for StubLoader {
    fn load(&self, entry: &EntryPoint) -> Result<Box<dyn DynamicModule>, ModuleError> {
        let behaviour = locked(&self.libraries)
            .get(entry.library())
            .copied()
            .ok_or_else(|| ModuleError::Open {
                library: entry.library_file_name(),
                diagnostic: String::from("cannot open shared object file: No such file or directory"),
            })?;
        self.log.record(format!("{}.load", entry.library()));
        Ok(Box::new(StubModule {
            library: entry.library().to_owned(),
            behaviour,
            log: self.log.clone(),
        }))
    }
}

/// Ready stream that keeps its output and logs each completed line.
#[derive(Debug, Clone, Default)]
pub struct ReadyBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
    log: CallLog,
}

impl ReadyBuffer {
    pub fn new(log: CallLog) -> Self {
        Self {
            bytes: Arc::default(),
            log,
        }
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&locked(&self.bytes)).into_owned()
    }
}

impl Write for ReadyBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        locked(&self.bytes).extend_from_slice(buf);
        for _ in buf.iter().filter(|byte| **byte == b'\n') {
            self.log.record("ready");
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Ready stream whose writes always fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Where the dispatch adapter fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterFault {
    Create,
    Activate,
}

/// Adapter whose activation always fails.
struct RefusingAdapter {
    name: String,
}

impl ObjectAdapter for RefusingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn activate(&mut self) -> Result<(), CommunicatorError> {
        Err(CommunicatorError::Activation {
            name: self.name.clone(),
            message: String::from("endpoint already in use"),
        })
    }
}

/// Communicator delegating to a [`LocalCommunicator`] but failing its
/// adapter.
struct FaultyCommunicator {
    inner: Arc<LocalCommunicator>,
    fault: AdapterFault,
}

impl Communicator for FaultyCommunicator {
    fn properties(&self) -> &Properties {
        self.inner.properties()
    }

    fn create_adapter(
        &self,
        name: &str,
        _endpoints: &str,
    ) -> Result<Box<dyn ObjectAdapter>, CommunicatorError> {
        match self.fault {
            AdapterFault::Create => Err(CommunicatorError::AdapterCreation {
                name: name.to_owned(),
                message: String::from("no endpoints configured"),
            }),
            AdapterFault::Activate => Ok(Box::new(RefusingAdapter {
                name: name.to_owned(),
            })),
        }
    }

    fn wait_for_shutdown(&self) {
        self.inner.wait_for_shutdown();
    }

    fn shutdown(&self) {
        self.inner.shutdown();
    }
}

/// Health events captured by [`RecordingHealthReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    CollectionStarting(usize),
    ServiceLoaded(String),
    ServiceInitialized(String),
    ServiceStarted(String),
    ServicesReady(usize),
    ServiceStopped(String),
    ServiceStopFailed(String),
    StartupFailed(FailureKind, Option<String>),
}

/// Reporter that stores every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub fn events(&self) -> Vec<HealthEvent> {
        locked(&self.events).clone()
    }

    fn push(&self, event: HealthEvent) {
        locked(&self.events).push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn collection_starting(&self, declared: usize) {
        self.push(HealthEvent::CollectionStarting(declared));
    }

    fn service_loaded(&self, service: &str, _module: &str) {
        self.push(HealthEvent::ServiceLoaded(service.to_owned()));
    }

    fn service_initialized(&self, service: &str) {
        self.push(HealthEvent::ServiceInitialized(service.to_owned()));
    }

    fn service_started(&self, service: &str) {
        self.push(HealthEvent::ServiceStarted(service.to_owned()));
    }

    fn services_ready(&self, count: usize) {
        self.push(HealthEvent::ServicesReady(count));
    }

    fn service_stopped(&self, service: &str) {
        self.push(HealthEvent::ServiceStopped(service.to_owned()));
    }

    fn service_stop_failed(&self, error: &HostError) {
        self.push(HealthEvent::ServiceStopFailed(
            error.service().unwrap_or_default().to_owned(),
        ));
    }

    fn startup_failed(&self, error: &HostError) {
        self.push(HealthEvent::StartupFailed(
            error.kind(),
            error.service().map(str::to_owned),
        ));
    }
}

/// Assembles a host over stub collaborators.
pub struct HostHarness {
    pub log: CallLog,
    pub loader: StubLoader,
    pub reporter: Arc<RecordingHealthReporter>,
    pub ready: ReadyBuffer,
    properties: Properties,
    args: Vec<String>,
    shutdown_early: bool,
    adapter_fault: Option<AdapterFault>,
    broken_ready_stream: bool,
    communicator: Option<Arc<LocalCommunicator>>,
}

impl Default for HostHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl HostHarness {
    pub fn new() -> Self {
        let log = CallLog::default();
        Self {
            loader: StubLoader::new(log.clone()),
            ready: ReadyBuffer::new(log.clone()),
            log,
            reporter: Arc::new(RecordingHealthReporter::default()),
            properties: Properties::new(),
            args: Vec::new(),
            shutdown_early: true,
            adapter_fault: None,
            broken_ready_stream: false,
            communicator: None,
        }
    }

    /// Declares `name` and registers the library its entry point names.
    pub fn declare(&mut self, name: &str, declaration: &str) {
        if let Some(entry) = declaration
            .split_whitespace()
            .next()
            .and_then(|text| EntryPoint::parse(text).ok())
        {
            self.loader.register(entry.library());
        }
        self.declare_missing(name, declaration);
    }

    /// Declares `name` without registering its library.
    pub fn declare_missing(&mut self, name: &str, declaration: &str) {
        self.properties
            .set(format!("{SERVICE_PREFIX}{name}"), declaration);
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.properties.set(key, value);
    }

    pub fn ready_marker(&mut self, marker: &str) {
        self.set(READY_PROPERTY, marker);
    }

    pub fn arg(&mut self, arg: &str) {
        self.args.push(arg.to_owned());
    }

    pub fn configure(&mut self, library: &str, change: impl FnOnce(&mut Behaviour)) {
        self.loader.configure(library, change);
    }

    /// Lets a service request shutdown instead of requesting it up front.
    pub fn shutdown_from_service(&mut self, library: &str) {
        self.shutdown_early = false;
        self.configure(library, |behaviour| behaviour.request_shutdown_on_start = true);
    }

    /// Makes the dispatch adapter fail at `fault`.
    pub fn fail_adapter(&mut self, fault: AdapterFault) {
        self.adapter_fault = Some(fault);
    }

    /// Makes every write of the ready line fail.
    pub fn break_ready_stream(&mut self) {
        self.broken_ready_stream = true;
    }

    pub fn build(&mut self) -> ServiceHost {
        let local = Arc::new(LocalCommunicator::new(self.properties.clone()));
        self.communicator = Some(Arc::clone(&local));
        let communicator: Arc<dyn Communicator> = match self.adapter_fault {
            Some(fault) => Arc::new(FaultyCommunicator {
                inner: local,
                fault,
            }),
            None => local,
        };
        let builder = ServiceHost::builder(communicator)
            .args(self.args.clone())
            .loader(self.loader.clone())
            .reporter(Arc::clone(&self.reporter) as Arc<dyn HealthReporter>);
        if self.broken_ready_stream {
            builder.ready_stream(BrokenPipe).build()
        } else {
            builder.ready_stream(self.ready.clone()).build()
        }
    }

    /// Builds a host and runs it to completion.
    pub fn run(&mut self) -> Result<StopReport, HostError> {
        let mut host = self.build();
        if self.shutdown_early {
            host.shutdown_handle().request();
        }
        host.run()
    }

    pub fn adapter_active(&self) -> bool {
        self.communicator
            .as_ref()
            .is_some_and(|communicator| communicator.is_activated(keel_config::ADAPTER_NAME))
    }

    pub fn lifecycle(&self) -> Vec<String> {
        self.log.lifecycle()
    }
}
