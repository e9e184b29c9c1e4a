//! High-level SysV service facade.
use crate::{
    config::ServiceDefinition,
    control::ServiceController,
    error::ServiceError,
    flavor::{self, Flavor, HostProbe, SystemProbe},
    install::{Installer, Layout},
    logger::{self, ServiceLogger},
    run::{Program, Supervisor},
};

/// A service registered (or to be registered) with the host's SysV init.
///
/// Bundles the declarative definition with the host probe and filesystem
/// layout, and exposes the full lifecycle: install/uninstall on disk,
/// start/stop/restart through the host front-end, and the in-process run
/// loop for the embedded program.
pub struct SysvService<P: HostProbe = SystemProbe> {
    definition: ServiceDefinition,
    installer: Installer<P>,
    controller: ServiceController,
    probe: P,
}

impl SysvService<SystemProbe> {
    /// Builds a service against the real host.
    pub fn new(definition: ServiceDefinition) -> Result<Self, ServiceError> {
        Self::with_probe_and_layout(definition, SystemProbe, Layout::default())
    }
}

impl<P: HostProbe + Clone> SysvService<P> {
    /// Builds a service with an injected probe and layout.
    pub fn with_probe_and_layout(
        definition: ServiceDefinition,
        probe: P,
        layout: Layout,
    ) -> Result<Self, ServiceError> {
        definition.validate()?;
        let controller = ServiceController::new(definition.name.clone());
        let installer = Installer::with_probe_and_layout(probe.clone(), layout);
        Ok(Self {
            definition,
            installer,
            controller,
            probe,
        })
    }

    /// The underlying service definition.
    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    /// Human label for the service.
    pub fn display_name(&self) -> &str {
        self.definition.display_name()
    }

    /// Detects the host's init flavor.
    pub fn flavor(&self) -> Result<Flavor, ServiceError> {
        flavor::detect(&self.probe)
    }

    /// Writes the control script and activation links.
    pub fn install(&self) -> Result<(), ServiceError> {
        self.installer.install(&self.definition)
    }

    /// Removes the activation links and control script.
    pub fn uninstall(&self) -> Result<(), ServiceError> {
        self.installer.uninstall(&self.definition)
    }

    /// Asks the host front-end to start the installed service.
    pub fn start(&self) -> Result<(), ServiceError> {
        self.controller.start()
    }

    /// Asks the host front-end to stop the installed service.
    pub fn stop(&self) -> Result<(), ServiceError> {
        self.controller.stop()
    }

    /// Stop-then-start through the host front-end.
    pub fn restart(&self) -> Result<(), ServiceError> {
        self.controller.restart()
    }

    /// Runs the embedded program until a termination signal arrives.
    pub fn run(&self, program: &mut dyn Program) -> Result<(), ServiceError> {
        Supervisor::new(&self.definition).run(program)
    }

    /// Logging channel for the embedded program: console when interactive,
    /// syslog otherwise.
    pub fn logger(&self) -> Box<dyn ServiceLogger> {
        logger::select(&self.definition.name)
    }
}
