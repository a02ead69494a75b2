//! Builder wiring a [`ServiceHost`] to its collaborators.

use std::io::{self, Write};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::communicator::Communicator;
use crate::context::HostContext;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::module::{LibraryLoader, ModuleLoader};

use super::{HostPhase, ServiceHost};

/// Configures the collaborators of a [`ServiceHost`].
///
/// Unset collaborators default to [`LibraryLoader`],
/// [`StructuredHealthReporter`], and standard output for the ready line.
pub struct ServiceHostBuilder {
    communicator: Arc<dyn Communicator>,
    args: Vec<String>,
    loader: Option<Box<dyn ModuleLoader>>,
    reporter: Option<Arc<dyn HealthReporter>>,
    ready_stream: Option<Box<dyn Write>>,
}

impl ServiceHostBuilder {
    pub(crate) const fn new(communicator: Arc<dyn Communicator>) -> Self {
        Self {
            communicator,
            args: Vec::new(),
            loader: None,
            reporter: None,
            ready_stream: None,
        }
    }

    /// Sets the residual process arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the module loader.
    #[must_use]
    pub fn loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Replaces the health reporter.
    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn HealthReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Replaces the stream receiving the ready line.
    #[must_use]
    pub fn ready_stream(mut self, stream: impl Write + 'static) -> Self {
        self.ready_stream = Some(Box::new(stream));
        self
    }

    /// Builds the host.
    #[must_use]
    pub fn build(self) -> ServiceHost {
        let Self {
            communicator,
            args,
            loader,
            reporter,
            ready_stream,
        } = self;
        let host_options = communicator.properties().command_line_options();
        ServiceHost {
            context: HostContext::new(Arc::clone(&communicator)),
            communicator,
            host_options,
            args,
            loader: loader.unwrap_or_else(|| Box::new(LibraryLoader::new())),
            reporter: reporter.unwrap_or_else(|| Arc::new(StructuredHealthReporter::new())),
            ready_stream: ready_stream.unwrap_or_else(|| Box::new(io::stdout())),
            adapter: None,
            registry: IndexMap::new(),
            phase: HostPhase::Idle,
        }
    }
}
