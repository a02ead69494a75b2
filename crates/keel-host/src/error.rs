//! Failure taxonomy for hosted services and their modules.

use std::any::Any;
use std::error::Error as StdError;
use std::io;
use std::iter;

use strum::Display;
use thiserror::Error;

use crate::host::HostPhase;

/// Boxed cause attached to a [`ServiceError`].
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Error returned by service factories and lifecycle operations.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ServiceError {
    message: String,
    #[source]
    source: Option<BoxedCause>,
}

impl ServiceError {
    /// Builds an error from a description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error from a description and an underlying cause.
    #[must_use]
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxedCause>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Builds an error describing a panic payload caught at the plugin
    /// boundary.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|text| (*text).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| String::from("non-string panic payload"));
        Self::new(format!("panicked: {detail}"))
    }

    /// Replaces the cause chain with an owned rendering of it.
    ///
    /// A cause built by plugin code carries drop and formatting code from
    /// the plugin's module, so the host detaches every error it receives
    /// before that module can be released.
    #[must_use]
    pub fn detach(self) -> Self {
        let Self { message, source } = self;
        Self {
            message,
            source: source.map(render_cause),
        }
    }

    /// Returns the error description without its cause.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Cause chain flattened into host-owned text.
#[derive(Debug, Error)]
#[error("{0}")]
struct DetachedCause(String);

fn render_cause(cause: BoxedCause) -> BoxedCause {
    let head: &(dyn StdError + 'static) = cause.as_ref();
    let rendered = iter::successors(Some(head), |&error| error.source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ");
    Box::new(DetachedCause(rendered))
}

impl From<String> for ServiceError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ServiceError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Errors raised while locating a module or one of its symbols.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// The declaration carried no entry point.
    #[error("no entry point specified")]
    MissingEntryPoint,
    /// The module could not be opened.
    #[error("cannot open `{library}`: {diagnostic}")]
    Open {
        /// Library the loader attempted to open.
        library: String,
        /// Diagnostic reported by the platform loader.
        diagnostic: String,
    },
    /// The module does not export the requested symbol.
    #[error("cannot resolve symbol `{symbol}`: {diagnostic}")]
    Symbol {
        /// Symbol that failed to resolve.
        symbol: String,
        /// Diagnostic reported by the platform loader.
        diagnostic: String,
    },
}

/// Errors raised by the communication layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommunicatorError {
    /// The object adapter could not be created.
    #[error("failed to create object adapter `{name}`: {message}")]
    AdapterCreation {
        /// Adapter name.
        name: String,
        /// Description of the failure.
        message: String,
    },
    /// The object adapter could not be activated.
    #[error("failed to activate object adapter `{name}`: {message}")]
    Activation {
        /// Adapter name.
        name: String,
        /// Description of the failure.
        message: String,
    },
}

/// Category of a [`HostError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// A module or its factory symbol could not be resolved.
    Load,
    /// The factory or `init` failed.
    Init,
    /// A service failed to start.
    Start,
    /// A service failed to stop.
    Stop,
    /// The dispatch adapter could not be created or activated.
    Adapter,
    /// The ready line could not be written.
    ReadyNotice,
    /// A lifecycle operation was called in the wrong phase.
    Lifecycle,
}

impl FailureKind {
    /// Returns `true` when failures of this kind abort startup.
    #[must_use]
    pub const fn is_fatal_to_startup(self) -> bool {
        !matches!(self, Self::Stop)
    }
}

/// Errors surfaced by the service host.
#[derive(Debug, Error)]
pub enum HostError {
    /// A service's module or factory symbol could not be resolved.
    #[error("unable to load entry point `{entry_point}` for service `{service}`: {source}")]
    Load {
        /// Declared service name.
        service: String,
        /// Entry point as written in the declaration.
        entry_point: String,
        /// Loader diagnostic.
        #[source]
        source: ModuleError,
    },
    /// The factory or `init` of a service failed.
    #[error("failed to initialise service `{service}`: {source}")]
    Init {
        /// Declared service name.
        service: String,
        /// Failure reported by the service.
        #[source]
        source: ServiceError,
    },
    /// A service failed to start.
    #[error("failed to start service `{service}`: {source}")]
    Start {
        /// Declared service name.
        service: String,
        /// Failure reported by the service.
        #[source]
        source: ServiceError,
    },
    /// A service failed to stop.
    #[error("failed to stop service `{service}`: {source}")]
    Stop {
        /// Declared service name.
        service: String,
        /// Failure reported by the service.
        #[source]
        source: ServiceError,
    },
    /// The dispatch adapter could not be created or activated.
    #[error("dispatch adapter failure: {source}")]
    Adapter {
        /// Failure reported by the communicator.
        #[source]
        source: CommunicatorError,
    },
    /// The ready line could not be written.
    #[error("failed to announce `{marker} ready`: {source}")]
    ReadyNotice {
        /// Configured ready marker.
        marker: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Startup was requested while services are still registered.
    #[error("cannot start services while the host is {phase}")]
    Lifecycle {
        /// Phase the host was in.
        phase: HostPhase,
    },
}

impl HostError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Load { .. } => FailureKind::Load,
            Self::Init { .. } => FailureKind::Init,
            Self::Start { .. } => FailureKind::Start,
            Self::Stop { .. } => FailureKind::Stop,
            Self::Adapter { .. } => FailureKind::Adapter,
            Self::ReadyNotice { .. } => FailureKind::ReadyNotice,
            Self::Lifecycle { .. } => FailureKind::Lifecycle,
        }
    }

    /// Returns `true` when this error aborts startup.
    #[must_use]
    pub const fn is_fatal_to_startup(&self) -> bool {
        self.kind().is_fatal_to_startup()
    }

    /// Returns the name of the service this error concerns, if any.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::Load { service, .. }
            | Self::Init { service, .. }
            | Self::Start { service, .. }
            | Self::Stop { service, .. } => Some(service),
            Self::Adapter { .. } | Self::ReadyNotice { .. } | Self::Lifecycle { .. } => None,
        }
    }
}
