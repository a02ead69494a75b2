//! Structured health reporting for service lifecycle events.

use std::sync::Arc;

use crate::error::HostError;

pub(crate) const HEALTH_TARGET: &str = "keel_host::health";

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before service declarations are collected.
    fn collection_starting(&self, declared: usize);

    /// Invoked after a service's module has been loaded.
    fn service_loaded(&self, service: &str, module: &str);

    /// Invoked after a service's `init` succeeds and it is registered.
    fn service_initialized(&self, service: &str);

    /// Invoked after a service's `start` succeeds.
    fn service_started(&self, service: &str);

    /// Invoked once every service has started.
    fn services_ready(&self, count: usize);

    /// Invoked after a service's `stop` succeeds.
    fn service_stopped(&self, service: &str);

    /// Invoked when a service's `stop` fails.
    fn service_stop_failed(&self, error: &HostError);

    /// Invoked when startup aborts.
    fn startup_failed(&self, error: &HostError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn collection_starting(&self, declared: usize) {
        (**self).collection_starting(declared);
    }

    fn service_loaded(&self, service: &str, module: &str) {
        (**self).service_loaded(service, module);
    }

    fn service_initialized(&self, service: &str) {
        (**self).service_initialized(service);
    }

    fn service_started(&self, service: &str) {
        (**self).service_started(service);
    }

    fn services_ready(&self, count: usize) {
        (**self).services_ready(count);
    }

    fn service_stopped(&self, service: &str) {
        (**self).service_stopped(service);
    }

    fn service_stop_failed(&self, error: &HostError) {
        (**self).service_stop_failed(error);
    }

    fn startup_failed(&self, error: &HostError) {
        (**self).startup_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn collection_starting(&self, declared: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "collection_starting",
            declared,
            "collecting service declarations"
        );
    }

    fn service_loaded(&self, service: &str, module: &str) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "service_loaded",
            service,
            module,
            "service module loaded"
        );
    }

    fn service_initialized(&self, service: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "service_initialized",
            service,
            "service initialised"
        );
    }

    fn service_started(&self, service: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "service_started",
            service,
            "service started"
        );
    }

    fn services_ready(&self, count: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "services_ready",
            count,
            "all services started"
        );
    }

    fn service_stopped(&self, service: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "service_stopped",
            service,
            "service stopped"
        );
    }

    fn service_stop_failed(&self, error: &HostError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "service_stop_failed",
            service = error.service().unwrap_or_default(),
            error = %error,
            "service failed to stop"
        );
    }

    fn startup_failed(&self, error: &HostError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "startup_failed",
            kind = %error.kind(),
            service = error.service().unwrap_or_default(),
            error = %error,
            "service host startup failed"
        );
    }
}
