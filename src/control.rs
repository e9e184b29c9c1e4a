//! Control proxy delegating start/stop requests to the host's generic
//! `service` front-end.
//!
//! This is a thin delegation: the front-end owns process control, and the
//! proxy only interprets its exit status. The init system remains
//! responsible for crash supervision.

use std::{path::PathBuf, process::Command, thread, time::Duration};

use tracing::{info, warn};

use crate::{
    constants::{RESTART_DELAY, SERVICE_FRONTEND},
    error::ServiceError,
};

/// Issues start/stop/restart requests for one installed service.
pub struct ServiceController {
    name: String,
    frontend: PathBuf,
    restart_delay: Duration,
}

impl ServiceController {
    /// Controller for `name` using the system `service` front-end.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frontend: PathBuf::from(SERVICE_FRONTEND),
            restart_delay: RESTART_DELAY,
        }
    }

    /// Overrides the front-end binary, used by tests.
    pub fn with_frontend(mut self, frontend: impl Into<PathBuf>) -> Self {
        self.frontend = frontend.into();
        self
    }

    /// Starts the installed service.
    pub fn start(&self) -> Result<(), ServiceError> {
        self.dispatch("start")
    }

    /// Stops the installed service.
    pub fn stop(&self) -> Result<(), ServiceError> {
        self.dispatch("stop")
    }

    /// Stops, waits briefly for the host to release resources (such as a
    /// listening socket), then starts. Aborts before starting if stop fails.
    pub fn restart(&self) -> Result<(), ServiceError> {
        self.stop()?;
        thread::sleep(self.restart_delay);
        self.start()
    }

    /// Runs `service <name> <action>` synchronously.
    fn dispatch(&self, action: &str) -> Result<(), ServiceError> {
        let command_line =
            format!("{} {} {action}", self.frontend.display(), self.name);
        info!("Running {command_line}");

        let output = Command::new(&self.frontend)
            .arg(&self.name)
            .arg(action)
            .output()
            .map_err(|source| ServiceError::CommandSpawn {
                command: command_line.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("{command_line} failed: {stderr}");
            return Err(ServiceError::CommandFailed {
                command: command_line,
                status: output.status.to_string(),
                stderr,
            });
        }
        Ok(())
    }
}
