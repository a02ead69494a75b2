//! Lifecycle contract implemented by hosted services.

use keel_config::Properties;

use crate::context::HostContext;
use crate::error::ServiceError;

/// A pluggable unit of functionality driven by the host.
///
/// The host calls [`Service::init`] exactly once, then [`Service::start`],
/// and finally [`Service::stop`]. `stop` is also called during startup
/// rollback, so it must tolerate running without a completed `start`.
#[cfg_attr(test, mockall::automock)]
pub trait Service: Send {
    /// Configures the service from its composed property set and residual
    /// arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the service cannot be configured.
    fn init(
        &mut self,
        name: &str,
        context: &HostContext,
        properties: &Properties,
        args: &[String],
    ) -> Result<(), ServiceError>;

    /// Begins producing work.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the service cannot start.
    fn start(&mut self) -> Result<(), ServiceError>;

    /// Stops producing work and releases resources.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when teardown fails. The host reports the
    /// failure and continues stopping the remaining services.
    fn stop(&mut self) -> Result<(), ServiceError>;
}
