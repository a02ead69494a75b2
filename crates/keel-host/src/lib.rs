//! Service host for pluggable Keel services.
//!
//! The host discovers `Keel.Service.<name>` declarations in a flat property
//! set, loads each declaration's module through a [`ModuleLoader`], builds
//! the service through the module's factory, and drives every service
//! through `init`, `start`, and `stop`. Startup is all or nothing: a failure
//! while loading, initialising, or starting any service rolls back every
//! service registered so far before the failure is returned.
//!
//! Everything the host needs from the outside world is behind a trait, so
//! each collaborator can be replaced in tests:
//!
//! - [`Communicator`] supplies properties, the dispatch adapter, and the
//!   shutdown latch. [`LocalCommunicator`] is the in-process implementation.
//! - [`ModuleLoader`] and [`DynamicModule`] resolve factories.
//!   [`LibraryLoader`] opens platform shared libraries.
//! - [`HealthReporter`] observes lifecycle events.
//!   [`StructuredHealthReporter`] emits them as `tracing` events.
//!
//! Service libraries export a [`FactoryFn`] under
//! [`DEFAULT_FACTORY_SYMBOL`] or under the symbol named in the declaration.

mod communicator;
mod context;
mod error;
mod health;
mod host;
mod module;
mod service;

pub use communicator::{
    Communicator, LocalAdapter, LocalCommunicator, ObjectAdapter, ShutdownHandle,
};
pub use context::HostContext;
pub use error::{
    BoxedCause, CommunicatorError, FailureKind, HostError, ModuleError, ServiceError,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use host::{HostPhase, ServiceHost, ServiceHostBuilder, StopReport};
pub use module::{
    DEFAULT_FACTORY_SYMBOL, DynamicModule, EntryPoint, FactoryFn, LibraryLoader, LibraryModule,
    ModuleLoader, ServiceFactory,
};
pub use service::Service;
