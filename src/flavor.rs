//! Host flavor detection for the SysV backend.
//!
//! Classifies the host into one of the init convention families the script
//! renderer knows how to target. Detection is a pure function of a
//! [`HostProbe`] so tests can inject a fixed filesystem/`$PATH` view instead
//! of touching the real host.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use strum_macros::{AsRefStr, Display, EnumString};

use crate::{
    constants::{LSB_FUNCTIONS, REDHAT_FUNCTIONS, START_STOP_DAEMON},
    error::ServiceError,
};

/// The family of init conventions a host supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Flavor {
    /// Red-Hat-style init with daemon/status/killproc helper functions.
    Redhat,
    /// Debian-like system with start-stop-daemon available.
    Debian,
    /// Generic LSB-compliant fallback.
    Lsb,
}

/// Read-only view of the host used by flavor detection and link management.
pub trait HostProbe {
    /// Returns whether `path` exists on the host filesystem.
    fn file_exists(&self, path: &Path) -> bool;

    /// Resolves `program` on the command search path.
    fn find_program(&self, program: &str) -> Option<PathBuf>;
}

/// Probe backed by the real filesystem and `$PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl HostProbe for SystemProbe {
    fn file_exists(&self, path: &Path) -> bool {
        fs::metadata(path).is_ok()
    }

    fn find_program(&self, program: &str) -> Option<PathBuf> {
        let paths = env::var_os("PATH")?;
        env::split_paths(&paths).find_map(|dir| {
            let candidate = dir.join(program);
            fs::metadata(&candidate).is_ok().then_some(candidate)
        })
    }
}

/// Determines the SysV flavor of this host.
///
/// Priority order reflects specificity:
/// 1. Red-Hat helper functions are the richest (pidfile and lockfile
///    semantics), so they win when present.
/// 2. Without LSB functions no generated script can run anywhere, so the
///    host is rejected outright rather than degraded silently.
/// 3. start-stop-daemon gives reliable argument passing and privilege
///    dropping, so a Debian-like host is preferred over generic LSB.
/// 4. LSB is the universal fallback; even Debian and Red-Hat ship it.
pub fn detect(probe: &dyn HostProbe) -> Result<Flavor, ServiceError> {
    if probe.file_exists(Path::new(REDHAT_FUNCTIONS)) {
        return Ok(Flavor::Redhat);
    }
    if !probe.file_exists(Path::new(LSB_FUNCTIONS)) {
        return Err(ServiceError::UnsupportedHost(LSB_FUNCTIONS));
    }
    if probe.find_program(START_STOP_DAEMON).is_some() {
        return Ok(Flavor::Debian);
    }
    Ok(Flavor::Lsb)
}
