use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

use initd::{Flavor, ServiceDefinition, script};
use tempfile::tempdir;

fn definition() -> ServiceDefinition {
    let mut def = ServiceDefinition::new("webd", "/usr/local/bin/webd");
    def.display_name = Some("Web Daemon".into());
    def.description = "Serves the things".into();
    def.args = vec!["--config".into(), "/etc/webd/webd.yaml".into()];
    def.user_name = Some("www-data".into());
    def
}

#[test]
fn rendering_is_byte_identical_across_calls() {
    let def = definition();
    for flavor in [Flavor::Redhat, Flavor::Debian, Flavor::Lsb] {
        let first = script::render(&def, &def.executable, flavor);
        let second = script::render(&def, &def.executable, flavor);
        assert_eq!(first, second, "non-deterministic render for {flavor}");
    }
}

#[test]
fn scripts_expose_the_standard_subcommands() {
    let def = definition();
    for flavor in [Flavor::Redhat, Flavor::Debian, Flavor::Lsb] {
        let text = script::render(&def, &def.executable, flavor);
        assert!(text.starts_with("#!/bin/bash\n"));
        for needle in [
            "start|stop)",
            "restart|force-reload)",
            "status)",
            "Usage: $0 {start|stop|status|restart|force-reload}",
        ] {
            assert!(text.contains(needle), "{flavor}: missing {needle:?}");
        }
    }
}

#[test]
fn environment_overrides_are_sourced_in_order() {
    let def = definition();
    let text = script::render(&def, &def.executable, Flavor::Lsb);
    let default_pos = text
        .find("/etc/default/${NAME}")
        .expect("default override missing");
    let sysconfig_pos = text
        .find("/etc/sysconfig/${NAME}")
        .expect("sysconfig override missing");
    assert!(default_pos < sysconfig_pos);
}

#[test]
fn flavor_specific_launchers_do_not_leak_across_branches() {
    let def = definition();

    let redhat = script::render(&def, &def.executable, Flavor::Redhat);
    assert!(redhat.contains("daemon --pidfile="));
    assert!(!redhat.contains("start-stop-daemon"));
    assert!(!redhat.contains("log_daemon_msg"));

    let debian = script::render(&def, &def.executable, Flavor::Debian);
    assert!(debian.contains("start-stop-daemon --start"));
    assert!(debian.contains("--chuid www-data"));
    assert!(!debian.contains("daemon --pidfile="));

    let lsb = script::render(&def, &def.executable, Flavor::Lsb);
    assert!(lsb.contains("echo $! > \"$PIDFILE\""));
    assert!(!lsb.contains("start-stop-daemon"));
}

#[test]
fn metacharacter_fields_are_neutralized_everywhere() {
    let mut def = definition();
    def.args = vec!["--greeting".into(), "hello; rm -rf $HOME".into()];
    def.working_directory = Some("/srv/web d".into());
    def.chroot = Some("/jail/`id`".into());

    let debian = script::render(&def, &def.executable, Flavor::Debian);
    assert!(debian.contains("'hello; rm -rf $HOME'"));
    assert!(debian.contains("--chdir '/srv/web d'"));
    assert!(debian.contains("--chroot '/jail/`id`'"));

    let lsb = script::render(&def, &def.executable, Flavor::Lsb);
    assert!(lsb.contains("cd '/srv/web d'"));
    assert!(lsb.contains("'hello; rm -rf $HOME'"));
}

/// No-op stand-ins for the redhat function library.
const REDHAT_HELPER_STUBS: &str = "\
daemon() { :; }
status() { return 3; }
killproc() { :; }
success() { :; }
failure() { :; }
";

/// No-op stand-ins for the LSB function library and start-stop-daemon.
const LSB_HELPER_STUBS: &str = "\
log_daemon_msg() { :; }
log_end_msg() { :; }
log_success_msg() { :; }
log_failure_msg() { :; }
status_of_proc() { return 3; }
pidofproc() { return 3; }
start-stop-daemon() { :; }
killproc() { :; }
";

/// Swaps `needle` for `replacement`, failing loudly if the rendered text no
/// longer contains the line the harness relies on.
fn swap(text: &str, needle: &str, replacement: &str) -> String {
    assert!(text.contains(needle), "rendered script lost {needle:?}");
    text.replace(needle, replacement)
}

/// Runs the rendered script's `start` action under bash, with the distro
/// helper libraries replaced by stubs and the pidfile, lockfile, and
/// permission check redirected so the run stays inside `root`.
fn run_start_action(rendered: &str, root: &Path) {
    let (source_line, stubs) = if rendered.contains(". /etc/rc.d/init.d/functions") {
        (". /etc/rc.d/init.d/functions", REDHAT_HELPER_STUBS)
    } else {
        (". /lib/lsb/init-functions", LSB_HELPER_STUBS)
    };
    let mut text = swap(rendered, source_line, stubs);
    text = swap(
        &text,
        "test $(id -u) -eq \"0\"            || exit 4 # LSB exit: insufficient permissions",
        ":",
    );
    text = swap(
        &text,
        "PIDFILE=\"/var/run/${NAME}.pid\"",
        &format!("PIDFILE=\"{}/webd.pid\"", root.display()),
    );
    text = swap(
        &text,
        "LOCKFILE=\"/var/lock/subsys/${NAME}\"",
        &format!("LOCKFILE=\"{}/webd.lock\"", root.display()),
    );

    let path = root.join("webd.init");
    fs::write(&path, text).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

    let output = Command::new("bash")
        .arg(&path)
        .arg("start")
        .output()
        .unwrap();
    assert!(output.status.code().is_some(), "script died on a signal");
}

#[test]
fn injected_arguments_never_execute_when_scripts_run() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    let marker = root.join("escaped");

    // The service binary records the argument vector it actually receives.
    let exe = root.join("bin/webd");
    fs::create_dir_all(exe.parent().unwrap()).unwrap();
    fs::write(
        &exe,
        format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > {}/args.log\n", root.display()),
    )
    .unwrap();
    fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();

    let mut def = ServiceDefinition::new("webd", &exe);
    def.description = "Serves the things".into();
    def.args = vec![
        format!("$(touch {})", marker.display()),
        format!("`touch {}`", marker.display()),
        format!("; touch {}", marker.display()),
    ];

    for flavor in [Flavor::Redhat, Flavor::Debian, Flavor::Lsb] {
        let rendered = script::render(&def, &exe, flavor);
        run_start_action(&rendered, root);
        assert!(
            !marker.exists(),
            "{flavor}: a hostile argument escaped quoting and ran"
        );
    }

    // The LSB branch launches the binary directly, so the argument vector it
    // logged must carry the hostile tokens verbatim, as data.
    let logged = fs::read_to_string(root.join("args.log")).unwrap();
    assert!(logged.contains(&format!("$(touch {})", marker.display())));
    assert!(logged.contains(&format!("`touch {}`", marker.display())));
}
