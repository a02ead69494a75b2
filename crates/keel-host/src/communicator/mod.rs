//! Boundary to the communication layer hosting the dispatch adapter.
//!
//! The host only needs four things from the communication layer: its
//! properties, an object adapter it can activate once every service has
//! started, a blocking wait for shutdown, and a way to request that shutdown.
//! [`LocalCommunicator`] provides all four in-process.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use keel_config::Properties;
use tracing::info;

use crate::error::CommunicatorError;

pub(crate) const COMMUNICATOR_TARGET: &str = "keel_host::communicator";

/// Lifecycle operations the host calls on the communication layer.
pub trait Communicator: Send + Sync {
    /// Returns the process-wide property set.
    fn properties(&self) -> &Properties;

    /// Creates the object adapter `name` listening on `endpoints`.
    ///
    /// # Errors
    ///
    /// Returns [`CommunicatorError::AdapterCreation`] when the adapter cannot
    /// be created.
    fn create_adapter(
        &self,
        name: &str,
        endpoints: &str,
    ) -> Result<Box<dyn ObjectAdapter>, CommunicatorError>;

    /// Blocks until shutdown has been requested.
    fn wait_for_shutdown(&self);

    /// Requests shutdown, waking every waiter.
    fn shutdown(&self);
}

/// Request-dispatch surface owned by the host.
pub trait ObjectAdapter: Send {
    /// Returns the adapter name.
    fn name(&self) -> &str;

    /// Begins dispatching requests.
    ///
    /// # Errors
    ///
    /// Returns [`CommunicatorError::Activation`] when dispatch cannot begin.
    fn activate(&mut self) -> Result<(), CommunicatorError>;
}

/// In-process communicator with a condition-variable shutdown latch.
#[derive(Default)]
pub struct LocalCommunicator {
    properties: Properties,
    requested: Mutex<bool>,
    signal: Condvar,
    adapters: Mutex<Vec<(String, Arc<AtomicBool>)>>,
}

impl LocalCommunicator {
    /// Builds a communicator over `properties`.
    #[must_use]
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            ..Self::default()
        }
    }

    /// Returns `true` once shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        *self.latch()
    }

    /// Returns `true` when an adapter called `name` has been activated.
    #[must_use]
    pub fn is_activated(&self, name: &str) -> bool {
        self.adapters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|(adapter, active)| adapter == name && active.load(Ordering::Acquire))
    }

    fn latch(&self) -> MutexGuard<'_, bool> {
        self.requested.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for LocalCommunicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCommunicator")
            .field("properties", &self.properties.len())
            .field("shutdown_requested", &self.is_shutdown_requested())
            .finish_non_exhaustive()
    }
}

impl Communicator for LocalCommunicator {
    fn properties(&self) -> &Properties {
        &self.properties
    }

    fn create_adapter(
        &self,
        name: &str,
        endpoints: &str,
    ) -> Result<Box<dyn ObjectAdapter>, CommunicatorError> {
        let active = Arc::new(AtomicBool::new(false));
        let mut adapters = self.adapters.lock().unwrap_or_else(PoisonError::into_inner);
        // A recreated adapter replaces its predecessor.
        adapters.retain(|(existing, _)| existing != name);
        adapters.push((name.to_owned(), Arc::clone(&active)));
        drop(adapters);
        Ok(Box::new(LocalAdapter {
            name: name.to_owned(),
            endpoints: endpoints.to_owned(),
            active,
        }))
    }

    fn wait_for_shutdown(&self) {
        let mut requested = self.latch();
        while !*requested {
            requested = self
                .signal
                .wait(requested)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn shutdown(&self) {
        *self.latch() = true;
        self.signal.notify_all();
    }
}

/// Adapter created by [`LocalCommunicator`]; activation is recorded and
/// logged.
#[derive(Debug)]
pub struct LocalAdapter {
    name: String,
    endpoints: String,
    active: Arc<AtomicBool>,
}

impl ObjectAdapter for LocalAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn activate(&mut self) -> Result<(), CommunicatorError> {
        self.active.store(true, Ordering::Release);
        info!(
            target: COMMUNICATOR_TARGET,
            adapter = %self.name,
            endpoints = %self.endpoints,
            "object adapter activated"
        );
        Ok(())
    }
}

/// Cloneable handle that requests host shutdown from any thread.
///
/// Requesting shutdown only wakes the host's wait; the host stops its
/// services itself once the wait returns.
#[derive(Clone)]
pub struct ShutdownHandle {
    communicator: Arc<dyn Communicator>,
}

impl ShutdownHandle {
    /// Wraps `communicator`.
    #[must_use]
    pub const fn new(communicator: Arc<dyn Communicator>) -> Self {
        Self { communicator }
    }

    /// Requests orderly shutdown.
    pub fn request(&self) {
        info!(target: COMMUNICATOR_TARGET, "shutdown requested");
        self.communicator.shutdown();
    }
}

impl fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownHandle").finish_non_exhaustive()
    }
}
