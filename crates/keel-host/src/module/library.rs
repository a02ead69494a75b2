//! Shared-library modules opened with `libloading`.

use libloading::{Library, Symbol};
use tracing::debug;

use crate::error::ModuleError;

use super::{DynamicModule, EntryPoint, FactoryFn, ModuleLoader, ServiceFactory};

const MODULE_TARGET: &str = "keel_host::module";

/// Loader that opens entry points as platform shared libraries.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibraryLoader;

impl LibraryLoader {
    /// Builds a loader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ModuleLoader for LibraryLoader {
    fn load(&self, entry: &EntryPoint) -> Result<Box<dyn DynamicModule>, ModuleError> {
        let file_name = entry.library_file_name();
        debug!(target: MODULE_TARGET, library = %file_name, "opening service library");
        // SAFETY: opening a library runs its initialisers. Service libraries
        // are trusted code named by the host configuration.
        let library = unsafe { Library::new(&file_name) }.map_err(|error| ModuleError::Open {
            library: file_name.clone(),
            diagnostic: error.to_string(),
        })?;
        Ok(Box::new(LibraryModule {
            library,
            path: file_name,
        }))
    }
}

/// Shared library holding one or more service factories.
#[derive(Debug)]
pub struct LibraryModule {
    library: Library,
    path: String,
}

impl DynamicModule for LibraryModule {
    fn factory(&self, symbol: &str) -> Result<ServiceFactory, ModuleError> {
        // SAFETY: the exported symbol is declared with the `FactoryFn`
        // signature by contract with the service library.
        let function: Symbol<'_, FactoryFn> = unsafe { self.library.get(symbol.as_bytes()) }
            .map_err(|error| ModuleError::Symbol {
                symbol: symbol.to_owned(),
                diagnostic: error.to_string(),
            })?;
        Ok(ServiceFactory::from(*function))
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}
