//! Host context handed to factories and services.

use std::fmt;
use std::sync::Arc;

use keel_config::Properties;
use keel_shared::Shared;

use crate::communicator::{Communicator, ShutdownHandle};

struct ContextInner {
    communicator: Arc<dyn Communicator>,
}

/// Shared view of the host passed to every factory and `init` call.
///
/// Cloning is cheap; every clone refers to the same communicator.
#[derive(Clone)]
pub struct HostContext {
    inner: Shared<ContextInner>,
}

impl HostContext {
    /// Builds a context over `communicator`.
    #[must_use]
    pub fn new(communicator: Arc<dyn Communicator>) -> Self {
        Self {
            inner: Shared::new(ContextInner { communicator }),
        }
    }

    /// Returns the host communicator.
    #[must_use]
    pub fn communicator(&self) -> &dyn Communicator {
        self.inner.communicator.as_ref()
    }

    /// Returns the host property set.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        self.inner.communicator.properties()
    }

    /// Returns a handle that requests host shutdown.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(Arc::clone(&self.inner.communicator))
    }

    /// Returns the number of live clones of this context.
    #[must_use]
    pub fn holders(&self) -> usize {
        Shared::count(&self.inner)
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("holders", &self.holders())
            .finish_non_exhaustive()
    }
}
