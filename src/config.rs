//! Service definition management for initd.
use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    constants::{
        DEFAULT_START_PRIORITY, DEFAULT_START_RUNLEVELS, DEFAULT_STOP_PRIORITY,
        DEFAULT_STOP_RUNLEVELS,
    },
    error::ServiceError,
};

/// Declarative description of the service to register with the host init
/// system. Immutable for the lifetime of an operation.
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceDefinition {
    /// Unique identifier, used as the file and link suffix.
    pub name: String,
    /// Human-readable label; falls back to `name` when absent.
    pub display_name: Option<String>,
    /// Free-form description rendered into the script header.
    #[serde(default)]
    pub description: String,
    /// Absolute path of the service executable.
    pub executable: PathBuf,
    /// Ordered startup arguments passed to the executable.
    #[serde(default)]
    pub args: Vec<String>,
    /// User the service runs as, when the flavor supports dropping privileges.
    pub user_name: Option<String>,
    /// Working directory the service starts in.
    pub working_directory: Option<String>,
    /// Chroot directory for the service (debian flavor only).
    pub chroot: Option<String>,
    /// Backend-specific options.
    #[serde(default)]
    pub options: ServiceOptions,
}

/// Open-ended option set recognized by the SysV backend.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceOptions {
    /// Request a per-user unit. SysV has none, so installation fails fast.
    pub user_service: bool,
    /// Runlevels the service starts in.
    pub start_runlevels: Vec<u8>,
    /// Runlevels the service is stopped in.
    pub stop_runlevels: Vec<u8>,
    /// Boot-ordering priority for start links (0-99).
    pub start_priority: u8,
    /// Shutdown-ordering priority for stop links (0-99).
    pub stop_priority: u8,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            user_service: false,
            start_runlevels: DEFAULT_START_RUNLEVELS.to_vec(),
            stop_runlevels: DEFAULT_STOP_RUNLEVELS.to_vec(),
            start_priority: DEFAULT_START_PRIORITY,
            stop_priority: DEFAULT_STOP_PRIORITY,
        }
    }
}

impl ServiceDefinition {
    /// Creates a minimal definition with default options.
    pub fn new(name: impl Into<String>, executable: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            description: String::new(),
            executable: executable.into(),
            args: Vec::new(),
            user_name: None,
            working_directory: None,
            chroot: None,
            options: ServiceOptions::default(),
        }
    }

    /// Human label for the service, falling back to its name.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Checks structural invariants of the definition.
    ///
    /// The name becomes a file-name suffix under `/etc/init.d` and inside
    /// runlevel directories, so it must not contain separators or whitespace.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.name.is_empty() {
            return Err(ServiceError::InvalidDefinition(
                "service name must not be empty".into(),
            ));
        }
        if self.name.contains('/') || self.name.chars().any(char::is_whitespace) {
            return Err(ServiceError::InvalidDefinition(format!(
                "service name '{}' must not contain '/' or whitespace",
                self.name
            )));
        }
        if !self.executable.is_absolute() {
            return Err(ServiceError::InvalidDefinition(format!(
                "executable path '{}' must be absolute",
                self.executable.display()
            )));
        }

        let levels = self
            .options
            .start_runlevels
            .iter()
            .chain(self.options.stop_runlevels.iter());
        for level in levels {
            if *level > 6 {
                return Err(ServiceError::InvalidDefinition(format!(
                    "runlevel {level} is outside 0-6"
                )));
            }
        }
        for priority in [self.options.start_priority, self.options.stop_priority] {
            if priority > 99 {
                return Err(ServiceError::InvalidDefinition(format!(
                    "priority {priority} is outside 0-99"
                )));
            }
        }

        Ok(())
    }

    /// Loads and validates a service definition from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ServiceError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ServiceError::DefinitionRead(std::io::Error::new(
                e.kind(),
                format!("{} ({})", e, path.display()),
            ))
        })?;

        let definition: Self = serde_yaml::from_str(&content)?;
        definition.validate()?;
        Ok(definition)
    }
}
