//! Constants and well-known paths for the SysV backend.
//!
//! This module centralizes the magic values shared between the flavor probe,
//! the script renderer, and the installer so that every component agrees on
//! the same conventions.

use std::time::Duration;

// ============================================================================
// Runlevels and Priorities
// ============================================================================

/// Default runlevels the service is started in.
pub const DEFAULT_START_RUNLEVELS: [u8; 4] = [2, 3, 4, 5];

/// Default runlevels the service is stopped in.
pub const DEFAULT_STOP_RUNLEVELS: [u8; 3] = [0, 1, 6];

/// Default start priority (rendered as a two-digit `S` prefix).
pub const DEFAULT_START_PRIORITY: u8 = 50;

/// Default stop priority (rendered as a two-digit `K` prefix).
pub const DEFAULT_STOP_PRIORITY: u8 = 2;

// ============================================================================
// Well-known Paths
// ============================================================================

/// Directory holding installed control scripts.
pub const INIT_DIR: &str = "/etc/init.d";

/// Root under which flat `rc<N>.d` runlevel directories live (Debian/Ubuntu).
pub const RC_FLAT_ROOT: &str = "/etc";

/// Nested runlevel root used by Red-Hat-style layouts.
pub const RC_NESTED_ROOT: &str = "/etc/rc.d";

/// Red-Hat init function library; its presence classifies the host as redhat.
pub const REDHAT_FUNCTIONS: &str = "/etc/rc.d/init.d/functions";

/// LSB init function library; its absence makes the host unsupportable.
pub const LSB_FUNCTIONS: &str = "/lib/lsb/init-functions";

// ============================================================================
// External Programs
// ============================================================================

/// Debian privilege-dropping daemon launcher, probed on `$PATH`.
pub const START_STOP_DAEMON: &str = "start-stop-daemon";

/// Red-Hat-style activation link manager.
pub const CHKCONFIG: &str = "chkconfig";

/// Debian-style activation link manager.
pub const UPDATE_RC_D: &str = "update-rc.d";

/// Generic service front-end used by the control proxy.
pub const SERVICE_FRONTEND: &str = "service";

// ============================================================================
// Timing
// ============================================================================

/// Pause between stop and start during a restart, letting the host release
/// resources such as a listening socket.
pub const RESTART_DELAY: Duration = Duration::from_millis(50);

/// Capacity of the termination-signal channel. Large enough that the first
/// relevant signal is never dropped.
pub const SIGNAL_CHANNEL_CAPACITY: usize = 3;

// ============================================================================
// LSB Exit Codes (emitted by the generated script)
// ============================================================================

/// Invalid or excess arguments.
pub const LSB_EXIT_BAD_USAGE: u8 = 2;

/// Insufficient permission to perform the request.
pub const LSB_EXIT_NO_PERMISSION: u8 = 4;

/// The program is not installed.
pub const LSB_EXIT_NOT_INSTALLED: u8 = 5;
