//! Runtime supervisor bridging OS termination signals to the embedded
//! program's start/stop callbacks.
//!
//! The supervisor owns control flow once [`Supervisor::run`] is entered:
//! `{Idle} -> start -> {Running} -> first termination signal -> stop ->
//! {Terminated}`. There is no paused or restarting state; restart is the
//! control proxy re-invoking the whole process.

use std::sync::mpsc::{Receiver, sync_channel};

use tracing::{info, warn};

use crate::{
    config::ServiceDefinition,
    constants::SIGNAL_CHANNEL_CAPACITY,
    error::{ProgramError, ServiceError},
};

/// Capabilities the embedded program exposes to the supervisor. The core
/// owns orchestration; the program owns behavior.
pub trait Program {
    /// Called once when the service starts. Must not block; long-running
    /// work belongs on the program's own threads.
    fn start(&mut self, handle: &ServiceHandle) -> Result<(), ProgramError>;

    /// Called once after a termination signal is observed.
    fn stop(&mut self, handle: &ServiceHandle) -> Result<(), ProgramError>;
}

/// Opaque view of the running service context handed to callbacks.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    name: String,
    display_name: String,
}

impl ServiceHandle {
    /// The service's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The service's human-readable label.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Registers interest in termination-class signals (SIGTERM and interactive
/// interrupt) and returns the channel they arrive on.
///
/// The channel is bounded but large enough that the first relevant signal is
/// never dropped. Signal handlers are process-global, so this can be called
/// once per process.
pub fn termination_channel() -> Result<Receiver<()>, ctrlc::Error> {
    let (tx, rx) = sync_channel(SIGNAL_CHANNEL_CAPACITY);
    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })?;
    Ok(rx)
}

/// In-process run loop for one service.
pub struct Supervisor {
    handle: ServiceHandle,
}

impl Supervisor {
    /// Supervisor for the given definition.
    pub fn new(def: &ServiceDefinition) -> Self {
        Self {
            handle: ServiceHandle {
                name: def.name.clone(),
                display_name: def.display_name().to_string(),
            },
        }
    }

    /// Runs the program until a termination signal arrives.
    ///
    /// If `start` fails, its error is returned immediately and `stop` is
    /// never invoked. Otherwise the call blocks until the first termination
    /// signal, invokes `stop` exactly once, and returns its outcome.
    pub fn run(&self, program: &mut dyn Program) -> Result<(), ServiceError> {
        let signals = termination_channel()?;
        self.run_with_signals(program, &signals)
    }

    /// Run loop with an injected signal source, so tests can deliver a
    /// termination without raising a real signal.
    pub fn run_with_signals(
        &self,
        program: &mut dyn Program,
        signals: &Receiver<()>,
    ) -> Result<(), ServiceError> {
        program
            .start(&self.handle)
            .map_err(|source| ServiceError::ProgramStart {
                service: self.handle.name.clone(),
                source,
            })?;
        info!("Service '{}' running; waiting for termination", self.handle.name);

        // A closed channel means the signal source is gone; treat it as a
        // shutdown request rather than running unsupervised.
        if signals.recv().is_err() {
            warn!("Signal channel closed; shutting down '{}'", self.handle.name);
        }

        info!("Stopping service '{}'", self.handle.name);
        program
            .stop(&self.handle)
            .map_err(|source| ServiceError::ProgramStop {
                service: self.handle.name.clone(),
                source,
            })
    }
}
