//! Plugin boundary between the host and the code that provides services.
//!
//! A [`ModuleLoader`] turns an [`EntryPoint`] into a [`DynamicModule`], and
//! the module resolves a factory symbol into a [`ServiceFactory`]. The
//! production loader opens shared libraries with `libloading`; tests swap in
//! loaders that never touch the filesystem.

mod entry_point;
mod library;

use std::fmt;

use crate::context::HostContext;
use crate::error::{ModuleError, ServiceError};
use crate::service::Service;

pub use entry_point::EntryPoint;
pub use library::{LibraryLoader, LibraryModule};

/// Symbol resolved when an entry point names none.
pub const DEFAULT_FACTORY_SYMBOL: &str = "keel_service_factory";

/// Signature of the factory symbol exported by a service library.
///
/// The signature uses the Rust ABI, so a plugin must be built with the same
/// toolchain and `keel-host` version as the host loading it.
pub type FactoryFn = fn(&HostContext) -> Result<Box<dyn Service>, ServiceError>;

type FactoryCall = dyn Fn(&HostContext) -> Result<Box<dyn Service>, ServiceError>;

/// Callable that constructs a service instance.
pub struct ServiceFactory {
    call: Box<FactoryCall>,
}

impl ServiceFactory {
    /// Wraps a factory callable.
    #[must_use]
    pub fn new<F>(call: F) -> Self
    where
        F: Fn(&HostContext) -> Result<Box<dyn Service>, ServiceError> + 'static,
    {
        Self {
            call: Box::new(call),
        }
    }

    /// Invokes the factory.
    ///
    /// # Errors
    ///
    /// Propagates the factory's [`ServiceError`].
    pub fn create(&self, context: &HostContext) -> Result<Box<dyn Service>, ServiceError> {
        (self.call)(context)
    }
}

impl From<FactoryFn> for ServiceFactory {
    fn from(function: FactoryFn) -> Self {
        Self::new(function)
    }
}

impl fmt::Debug for ServiceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceFactory").finish_non_exhaustive()
    }
}

/// Loaded unit of code providing service factories.
///
/// Dropping the module may unload its code, so every service it produced
/// must be dropped first.
pub trait DynamicModule {
    /// Resolves the factory exported as `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Symbol`] when the symbol cannot be resolved.
    fn factory(&self, symbol: &str) -> Result<ServiceFactory, ModuleError>;

    /// Describes the module for diagnostics, typically its path.
    fn describe(&self) -> String;
}

/// Source of [`DynamicModule`]s.
pub trait ModuleLoader {
    /// Loads the module named by `entry`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Open`] when the module cannot be opened.
    fn load(&self, entry: &EntryPoint) -> Result<Box<dyn DynamicModule>, ModuleError>;
}

impl<T> ModuleLoader for Box<T>
where
    T: ModuleLoader + ?Sized,
{
    fn load(&self, entry: &EntryPoint) -> Result<Box<dyn DynamicModule>, ModuleError> {
        (**self).load(entry)
    }
}
