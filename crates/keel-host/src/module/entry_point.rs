//! Entry-point identifiers of the form `<library>[:<symbol>]`.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::fmt;
use std::path::Path;

use crate::error::ModuleError;

use super::DEFAULT_FACTORY_SYMBOL;

/// Library and factory symbol named by a service declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    library: String,
    symbol: String,
}

impl EntryPoint {
    /// Parses `<library>[:<symbol>]`.
    ///
    /// A trailing `:<symbol>` is honoured only when the symbol contains no
    /// path separator, so drive-qualified Windows paths stay intact. A
    /// missing or empty symbol selects [`DEFAULT_FACTORY_SYMBOL`].
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::MissingEntryPoint`] when no library is named.
    pub fn parse(text: &str) -> Result<Self, ModuleError> {
        let trimmed = text.trim();
        let (library, symbol) = match trimmed.rsplit_once(':') {
            Some((library, symbol)) if !symbol.contains(['/', '\\']) => (library, symbol),
            _ => (trimmed, ""),
        };
        if library.is_empty() {
            return Err(ModuleError::MissingEntryPoint);
        }
        let resolved_symbol = if symbol.is_empty() {
            DEFAULT_FACTORY_SYMBOL
        } else {
            symbol
        };
        Ok(Self {
            library: library.to_owned(),
            symbol: resolved_symbol.to_owned(),
        })
    }

    /// Returns the library as written.
    #[must_use]
    pub fn library(&self) -> &str {
        &self.library
    }

    /// Returns the factory symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the file name handed to the platform loader.
    ///
    /// A bare name such as `hello` maps to `libhello.so`, `hello.dll`, or
    /// `libhello.dylib`. Paths and names with an extension are used as
    /// written.
    #[must_use]
    pub fn library_file_name(&self) -> String {
        let bare = !self.library.contains(['/', '\\'])
            && Path::new(&self.library).extension().is_none();
        if bare {
            format!("{DLL_PREFIX}{}{DLL_SUFFIX}", self.library)
        } else {
            self.library.clone()
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.library, self.symbol)
    }
}
