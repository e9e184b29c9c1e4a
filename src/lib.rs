//! Initd lets a long-running program register itself as a host-managed
//! background service across the SysV family of Linux init ecosystems
//! (Red-Hat-style helpers, Debian's start-stop-daemon, and generic LSB)
//! without the caller knowing which flavor is present. It detects the host
//! flavor, renders and installs a control script with its runlevel
//! activation links, proxies start/stop/restart through the host's `service`
//! front-end, and bridges termination signals to the embedded program's own
//! start/stop callbacks.

/// Service definition management.
pub mod config;

/// Constants and well-known init paths.
pub mod constants;

/// Control proxy over the host `service` front-end.
pub mod control;

/// Error handling.
pub mod error;

/// Host flavor detection.
pub mod flavor;

/// Script and activation-link installation.
pub mod install;

/// Console/syslog logging channel selection.
pub mod logger;

/// Runtime supervisor and termination signals.
pub mod run;

/// Control-script rendering.
pub mod script;

/// High-level service facade.
pub mod service;

pub use config::{ServiceDefinition, ServiceOptions};
pub use error::{ProgramError, ServiceError};
pub use flavor::{Flavor, HostProbe, SystemProbe};
pub use run::{Program, ServiceHandle};
pub use service::SysvService;
