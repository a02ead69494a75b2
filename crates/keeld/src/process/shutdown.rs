use std::io;
use std::thread::{self, JoinHandle};

use keel_host::ShutdownHandle;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use thiserror::Error;
use tracing::{info, warn};

use super::PROCESS_TARGET;

/// Source of shutdown requests for a running host.
pub trait ShutdownSignal {
    /// Starts listening, requesting shutdown through `handle` when
    /// triggered.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the listener cannot be installed.
    fn listen(&self, handle: ShutdownHandle) -> Result<ShutdownListener, ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The listener thread could not be spawned.
    #[error("failed to spawn signal listener: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Running listener; closing it stops listening.
#[derive(Debug, Default)]
pub struct ShutdownListener {
    signals: Option<Handle>,
    thread: Option<JoinHandle<()>>,
}

impl ShutdownListener {
    /// Listener with nothing to tear down.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Stops listening and waits for the listener thread.
    pub fn close(mut self) {
        if let Some(signals) = self.signals.take() {
            signals.close();
        }
        let panicked = self
            .thread
            .take()
            .is_some_and(|thread| thread.join().is_err());
        if panicked {
            warn!(target: PROCESS_TARGET, "signal listener panicked");
        }
    }
}

/// Listener that requests shutdown on SIGTERM, SIGINT, SIGQUIT, or SIGHUP.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Builds a signal listener.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn listen(&self, handle: ShutdownHandle) -> Result<ShutdownListener, ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        let controller = signals.handle();
        let thread = thread::Builder::new()
            .name(String::from("keeld-signals"))
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    info!(target: PROCESS_TARGET, signal, "shutdown signal received");
                    handle.request();
                }
            })
            .map_err(|source| ShutdownError::Spawn { source })?;
        Ok(ShutdownListener {
            signals: Some(controller),
            thread: Some(thread),
        })
    }
}
