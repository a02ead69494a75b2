//! Registry entries pairing a service with the module that provides it.

use crate::error::ServiceError;
use crate::module::DynamicModule;
use crate::service::Service;

/// A registered service and its owning module.
pub(crate) struct ServiceRecord {
    // Field order is drop order: the service's code lives in the module.
    service: Box<dyn Service>,
    module: Box<dyn DynamicModule>,
}

impl ServiceRecord {
    pub(crate) fn new(service: Box<dyn Service>, module: Box<dyn DynamicModule>) -> Self {
        Self { service, module }
    }

    pub(crate) fn start(&mut self) -> Result<(), ServiceError> {
        self.service.start()
    }

    pub(crate) fn stop(&mut self) -> Result<(), ServiceError> {
        self.service.stop()
    }

    pub(crate) fn module_description(&self) -> String {
        self.module.describe()
    }

    /// Releases the service, then the module.
    pub(crate) fn release(self) {
        let Self { service, module } = self;
        drop(service);
        drop(module);
    }
}
