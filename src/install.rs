//! Installation and removal of SysV control scripts and activation links.
use std::{
    fs,
    os::unix::fs::{PermissionsExt, symlink},
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{debug, info, warn};

use crate::{
    config::ServiceDefinition,
    constants::{CHKCONFIG, INIT_DIR, RC_FLAT_ROOT, RC_NESTED_ROOT, UPDATE_RC_D},
    error::ServiceError,
    flavor::{self, HostProbe, SystemProbe},
    script,
};

/// On-disk locations the installer writes to.
///
/// Defaults to the host system paths; tests point the whole layout at a
/// temporary directory so install/uninstall round trips never touch `/etc`.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Directory holding control scripts.
    pub init_dir: PathBuf,
    /// Root containing flat `rc<N>.d` directories (Debian/Ubuntu layout).
    pub rc_flat_root: PathBuf,
    /// Nested runlevel root used by Red-Hat layouts when present.
    pub rc_nested_root: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            init_dir: PathBuf::from(INIT_DIR),
            rc_flat_root: PathBuf::from(RC_FLAT_ROOT),
            rc_nested_root: PathBuf::from(RC_NESTED_ROOT),
        }
    }
}

impl Layout {
    /// Builds a layout rooted under `root`, mirroring the `/etc` conventions.
    pub fn rooted(root: &Path) -> Self {
        Self {
            init_dir: root.join("init.d"),
            rc_flat_root: root.to_path_buf(),
            rc_nested_root: root.join("rc.d"),
        }
    }

    /// Path of the control script for `name`.
    pub fn script_path(&self, name: &str) -> PathBuf {
        self.init_dir.join(name)
    }

    /// Base directory holding `rc<N>.d` runlevel directories.
    ///
    /// Red-Hat-style hosts nest them under `rc.d`; Debian/Ubuntu keep them
    /// flat. A host with neither cannot take raw symlinks.
    fn link_base(&self) -> Result<PathBuf, ServiceError> {
        if self.rc_nested_root.is_dir() {
            return Ok(self.rc_nested_root.clone());
        }
        if self.rc_flat_root.join("rc0.d").is_dir() {
            return Ok(self.rc_flat_root.clone());
        }
        Err(ServiceError::NoRunlevelDir(self.rc_flat_root.clone()))
    }

    /// Activation link path for one runlevel.
    fn link_path(&self, base: &Path, level: u8, prefix: char, priority: u8, name: &str) -> PathBuf {
        base.join(format!("rc{level}.d"))
            .join(format!("{prefix}{priority:02}{name}"))
    }
}

/// Installs and removes control scripts plus their activation links.
pub struct Installer<P: HostProbe = SystemProbe> {
    probe: P,
    layout: Layout,
}

impl Installer<SystemProbe> {
    /// Installer against the real host filesystem and `$PATH`.
    pub fn new() -> Self {
        Self {
            probe: SystemProbe,
            layout: Layout::default(),
        }
    }
}

impl Default for Installer<SystemProbe> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: HostProbe> Installer<P> {
    /// Installer with an injected probe and layout, used by tests and by
    /// callers that manage a chroot-like tree.
    pub fn with_probe_and_layout(probe: P, layout: Layout) -> Self {
        Self { probe, layout }
    }

    /// Writes the control script and registers its activation links.
    ///
    /// Fails before any filesystem mutation when the definition requests a
    /// user-scope unit, when the executable is missing, or when a script for
    /// this name is already installed. A failure after the script is written
    /// is surfaced as-is; no rollback is attempted.
    pub fn install(&self, def: &ServiceDefinition) -> Result<(), ServiceError> {
        def.validate()?;
        if def.options.user_service {
            return Err(ServiceError::UserServiceUnsupported);
        }
        if !def.executable.is_file() {
            return Err(ServiceError::ExecutableNotFound(def.executable.clone()));
        }

        let flavor = flavor::detect(&self.probe)?;
        let script_path = self.layout.script_path(&def.name);
        if script_path.exists() {
            return Err(ServiceError::ScriptExists(script_path));
        }

        info!(
            "Installing init script for '{}' at {} (flavor: {flavor})",
            def.name,
            script_path.display()
        );

        let text = script::render(def, &def.executable, flavor);
        fs::write(&script_path, text).map_err(|source| ServiceError::Io {
            path: script_path.clone(),
            source,
        })?;
        fs::set_permissions(&script_path, fs::Permissions::from_mode(0o755)).map_err(
            |source| ServiceError::Io {
                path: script_path.clone(),
                source,
            },
        )?;

        self.manage_links(def, &script_path, true)
    }

    /// Removes the activation links, then the control script.
    pub fn uninstall(&self, def: &ServiceDefinition) -> Result<(), ServiceError> {
        def.validate()?;
        if def.options.user_service {
            return Err(ServiceError::UserServiceUnsupported);
        }

        let script_path = self.layout.script_path(&def.name);
        info!(
            "Removing init script for '{}' at {}",
            def.name,
            script_path.display()
        );

        self.manage_links(def, &script_path, false)?;

        fs::remove_file(&script_path).map_err(|source| ServiceError::Io {
            path: script_path.clone(),
            source,
        })
    }

    /// Builds the native link-tool invocation for this host, if any tool is
    /// on the search path. chkconfig is preferred over update-rc.d.
    fn link_tool_command(
        &self,
        def: &ServiceDefinition,
        install: bool,
    ) -> Option<(PathBuf, Vec<String>)> {
        if let Some(tool) = self.probe.find_program(CHKCONFIG) {
            let args = if install {
                vec!["--add".to_string(), def.name.clone()]
            } else {
                vec!["--del".to_string(), def.name.clone()]
            };
            return Some((tool, args));
        }
        if let Some(tool) = self.probe.find_program(UPDATE_RC_D) {
            let args = if install {
                vec![def.name.clone(), "defaults".to_string()]
            } else {
                vec!["-f".to_string(), def.name.clone(), "remove".to_string()]
            };
            return Some((tool, args));
        }
        None
    }

    /// Creates or removes activation links, preferring a native tool and
    /// falling back to raw symlinks over the configured runlevels.
    fn manage_links(
        &self,
        def: &ServiceDefinition,
        script_path: &Path,
        install: bool,
    ) -> Result<(), ServiceError> {
        if let Some((tool, args)) = self.link_tool_command(def, install) {
            return run_link_tool(&tool, &args);
        }

        let base = self.layout.link_base()?;
        debug!("No link tool found; managing symlinks under {}", base.display());

        let opts = &def.options;
        let links = opts
            .start_runlevels
            .iter()
            .map(|level| self.layout.link_path(&base, *level, 'S', opts.start_priority, &def.name))
            .chain(opts.stop_runlevels.iter().map(|level| {
                self.layout
                    .link_path(&base, *level, 'K', opts.stop_priority, &def.name)
            }));

        for link in links {
            if install {
                debug!("Creating activation link {}", link.display());
                symlink(script_path, &link).map_err(|source| ServiceError::Io {
                    path: link.clone(),
                    source,
                })?;
            } else {
                debug!("Removing activation link {}", link.display());
                fs::remove_file(&link).map_err(|source| ServiceError::Io {
                    path: link.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

/// Runs a native link-management tool, reporting the exact command line on
/// failure so operators can replay it.
fn run_link_tool(tool: &Path, args: &[String]) -> Result<(), ServiceError> {
    let command_line = format!("{} {}", tool.display(), args.join(" "));
    info!("Running {command_line}");

    let output = Command::new(tool).args(args).output().map_err(|source| {
        ServiceError::CommandSpawn {
            command: command_line.clone(),
            source,
        }
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
