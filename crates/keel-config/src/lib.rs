//! Configuration primitives shared by the Keel host and its services.
//!
//! Keel treats configuration as a flat, ordered set of string properties.
//! Service declarations, the ready marker, and the dispatch endpoints are all
//! ordinary properties under well-known keys (see [`defaults`]). Properties
//! are loaded from `key = value` files, overridden by explicit assignments,
//! and exchanged with services as `--key=value` command-line options.

pub mod defaults;
mod loader;
mod logging;
mod properties;

pub use defaults::{
    ADAPTER_NAME, DEFAULT_LOG_FILTER, ENDPOINTS_PROPERTY, READY_PROPERTY, RUNTIME_PREFIX,
    SERVICE_PREFIX, default_log_format,
};
pub use loader::{ConfigError, parse_assignment};
pub use logging::{LogFormat, LogFormatParseError};
pub use properties::Properties;
