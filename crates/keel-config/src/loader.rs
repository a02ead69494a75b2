//! Loading property sets from `key = value` files and assignments.
//!
//! Property files contain one assignment per line. Blank lines and lines whose
//! first non-blank character is `#` are ignored. Leading and trailing
//! whitespace around keys and values is trimmed. When a key appears more than
//! once the later line wins, but the key keeps the position of its first
//! definition.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::properties::Properties;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A property file could not be read.
    #[error("failed to read property file {path}: {source}")]
    Io {
        /// File that failed to load.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A line of a property file is not a valid assignment.
    #[error("{path}:{line}: {message}")]
    Syntax {
        /// File containing the offending line.
        path: Utf8PathBuf,
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
    /// An explicit `key=value` override is malformed.
    #[error("invalid property assignment `{text}`: expected key=value")]
    Assignment {
        /// Text supplied by the caller.
        text: String,
    },
}

/// Splits `text` into a trimmed key and value around its first `=`.
///
/// # Errors
///
/// Returns [`ConfigError::Assignment`] when `text` has no `=` or the key is
/// empty.
pub fn parse_assignment(text: &str) -> Result<(String, String), ConfigError> {
    split_line(text)
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| ConfigError::Assignment {
            text: text.to_owned(),
        })
}

fn split_line(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once('=')?;
    let trimmed_key = key.trim();
    if trimmed_key.is_empty() {
        return None;
    }
    Some((trimmed_key, value.trim()))
}

impl Properties {
    /// Loads the property file at `path` into `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, or
    /// [`ConfigError::Syntax`] for the first malformed line.
    pub fn load_file(&mut self, path: &Utf8Path) -> Result<(), ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        self.load_str(path, &contents)
    }

    /// Loads property assignments from `contents`, attributing errors to
    /// `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Syntax`] for the first malformed line.
    pub fn load_str(&mut self, origin: &Utf8Path, contents: &str) -> Result<(), ConfigError> {
        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = split_line(line).ok_or_else(|| ConfigError::Syntax {
                path: origin.to_owned(),
                line: index + 1,
                message: format!("expected `key = value`, found `{line}`"),
            })?;
            self.set(key, value);
        }
        Ok(())
    }

    /// Applies a `key=value` override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Assignment`] when `text` is malformed.
    pub fn apply_assignment(&mut self, text: &str) -> Result<(), ConfigError> {
        let (key, value) = parse_assignment(text)?;
        self.set(key, value);
        Ok(())
    }
}
