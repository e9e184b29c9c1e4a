//! Error handling for initd.
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by the embedded program's start/stop callbacks.
pub type ProgramError = Box<dyn std::error::Error + Send + Sync>;

/// Defines all possible errors that can occur while managing a SysV service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The definition requested a per-user unit, which SysV has no concept of.
    #[error("user services are not supported on System V")]
    UserServiceUnsupported,

    /// A control script for this name is already installed.
    #[error("init script already exists: {0}")]
    ScriptExists(PathBuf),

    /// The service executable could not be resolved to an absolute path.
    #[error("service executable not found: {0}")]
    ExecutableNotFound(PathBuf),

    /// An I/O operation on an install artifact failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The script or link path being written or removed.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// An external tool could not be spawned.
    #[error("failed to run `{command}`: {source}")]
    CommandSpawn {
        /// The full command line that was attempted.
        command: String,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// An external tool ran but reported failure.
    #[error("`{command}` failed with {status}: {stderr}")]
    CommandFailed {
        /// The full command line that was invoked.
        command: String,
        /// Exit status reported by the tool.
        status: String,
        /// Captured standard error output, trimmed.
        stderr: String,
    },

    /// The host lacks the init support required to generate any script.
    #[error("host is lacking LSB support ({0}); no init script can be generated")]
    UnsupportedHost(&'static str),

    /// No usable runlevel directory tree was found for raw symlink management.
    #[error("no suitable rc.d directory found under {0}")]
    NoRunlevelDir(PathBuf),

    /// The service definition failed validation.
    #[error("invalid service definition: {0}")]
    InvalidDefinition(String),

    /// Error reading a service definition file.
    #[error("failed to read service definition: {0}")]
    DefinitionRead(#[from] std::io::Error),

    /// Error parsing a YAML service definition.
    #[error("invalid YAML service definition: {0}")]
    DefinitionParse(#[from] serde_yaml::Error),

    /// Registering the termination-signal handler failed.
    #[error("failed to register termination signal handler: {0}")]
    SignalSetup(#[from] ctrlc::Error),

    /// The embedded program's start callback failed.
    #[error("service '{service}' failed to start: {source}")]
    ProgramStart {
        /// The service name whose start callback failed.
        service: String,
        /// The error returned by the callback.
        #[source]
        source: ProgramError,
    },

    /// The embedded program's stop callback failed.
    #[error("service '{service}' failed to stop: {source}")]
    ProgramStop {
        /// The service name whose stop callback failed.
        service: String,
        /// The error returned by the callback.
        #[source]
        source: ProgramError,
    },
}
