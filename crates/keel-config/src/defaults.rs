//! Well-known property names and built-in defaults.

/// Prefix of runtime-level options that every service property set accepts.
pub const RUNTIME_PREFIX: &str = "Keel";

/// Prefix of service declarations: `Keel.Service.<name> = <entry> [args...]`.
pub const SERVICE_PREFIX: &str = "Keel.Service.";

/// Property naming the marker echoed as `"<marker> ready"` once every service
/// has started.
pub const READY_PROPERTY: &str = "Keel.PrintServicesReady";

/// Property holding the endpoints of the host's own dispatch adapter.
pub const ENDPOINTS_PROPERTY: &str = "Keel.ServiceManager.Endpoints";

/// Name of the host's own dispatch adapter.
pub const ADAPTER_NAME: &str = "ServiceManagerAdapter";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
