//! Control-script rendering for the SysV backend.
//!
//! Rendering is a pure function of the service definition, the resolved
//! executable path, and the detected [`Flavor`]: no I/O, and the same inputs
//! always yield byte-identical script text. Each flavor contributes its own
//! header and start/stop fragments; the prelude and the dispatch `case` are
//! shared.

use std::path::Path;

use crate::{config::ServiceDefinition, flavor::Flavor};

/// Characters that may appear in a token without shell quoting.
fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}

/// Quotes a value for safe interpolation into generated shell text.
///
/// Tokens made entirely of safe characters pass through untouched, so the
/// transform is idempotent on already-safe values. Anything else is wrapped
/// in single quotes with embedded quotes rendered as `'\''`, which
/// neutralizes every shell metacharacter including `$`, backticks, and
/// semicolons.
pub fn sh_quote(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_shell_safe) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}

/// Re-quotes a token for splicing inside a double-quoted shell string.
///
/// The redhat `daemon` helper takes the whole launch command as one
/// double-quoted argument, and the outer shell performs a round of expansion
/// on that string before the helper's shell ever runs it. Single quotes do
/// not suppress `$`, backticks, or backslashes in that context, so the
/// [`sh_quote`] output is additionally backslash-escaped: after the outer
/// round strips the backslashes, the token is back at single-quote level
/// when the command string is finally executed.
fn sh_quote_in_dquotes(value: &str) -> String {
    let quoted = sh_quote(value);
    let mut escaped = String::with_capacity(quoted.len());
    for c in quoted.chars() {
        if matches!(c, '\\' | '$' | '`' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Renders the startup arguments as a single leading-space-separated run of
/// quoted tokens, matching how the script splices them after `$CMD`.
fn quoted_args(def: &ServiceDefinition) -> String {
    def.args
        .iter()
        .map(|arg| format!(" {}", sh_quote(arg)))
        .collect()
}

/// Startup arguments quoted for the redhat launch string, which lives inside
/// double quotes. See [`sh_quote_in_dquotes`].
fn dquoted_args(def: &ServiceDefinition) -> String {
    def.args
        .iter()
        .map(|arg| format!(" {}", sh_quote_in_dquotes(arg)))
        .collect()
}

fn two_digit(priority: u8) -> String {
    format!("{priority:02}")
}

fn levels_joined(levels: &[u8], separator: &str) -> String {
    levels
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Script header: a chkconfig block for redhat, an LSB INIT INFO block for
/// everything else, each sourcing its function library.
fn header(def: &ServiceDefinition, flavor: Flavor) -> String {
    match flavor {
        Flavor::Redhat => format!(
            "#\n\
             # {display}\n\
             #\n\
             # chkconfig:   {levels} {start} {stop}\n\
             # description: {description}\n\
             \n\
             # Source function library.\n\
             . /etc/rc.d/init.d/functions\n",
            display = def.display_name(),
            levels = levels_joined(&def.options.start_runlevels, ""),
            start = two_digit(def.options.start_priority),
            stop = two_digit(def.options.stop_priority),
            description = def.description,
        ),
        Flavor::Debian | Flavor::Lsb => format!(
            "### BEGIN INIT INFO\n\
             # Provides:          {name}\n\
             # Required-Start:    $local_fs $remote_fs $network $syslog\n\
             # Required-Stop:     $local_fs $remote_fs $network $syslog\n\
             # Default-Start:     {start_levels}\n\
             # Default-Stop:      {stop_levels}\n\
             # Short-Description: {display}\n\
             # Description:       {description}\n\
             ### END INIT INFO\n\
             \n\
             # Source function library.\n\
             . /lib/lsb/init-functions\n",
            name = def.name,
            start_levels = levels_joined(&def.options.start_runlevels, " "),
            stop_levels = levels_joined(&def.options.stop_runlevels, " "),
            display = def.display_name(),
            description = def.description,
        ),
    }
}

/// Shared variable block: pidfile/lockfile conventions, environment override
/// sourcing, and LSB precondition checks (exit 4 without root, exit 5
/// without the executable).
fn prelude(def: &ServiceDefinition, exec_path: &Path) -> String {
    format!(
        "CMD=\"{path}\"\n\
         NAME=\"{name}\"\n\
         DESC=\"{description}\"\n\
         \n\
         # The following can be overridden via configuration file\n\
         PIDFILE=\"/var/run/${{NAME}}.pid\"\n\
         LOCKFILE=\"/var/lock/subsys/${{NAME}}\"\n\
         \n\
         # Log output of $CMD\n\
         STDOUTLOG=\"/dev/null\"\n\
         STDERRLOG=\"/dev/null\"\n\
         \n\
         # Source configuration defaults to override above as appropriate.\n\
         ! test -e /etc/default/${{NAME}}   || . /etc/default/${{NAME}}\n\
         ! test -e /etc/sysconfig/${{NAME}} || . /etc/sysconfig/${{NAME}}\n\
         test $(id -u) -eq \"0\"            || exit 4 # LSB exit: insufficient permissions\n\
         test -x ${{CMD}}                   || exit 5 # LSB exit: program not installed\n\
         test -d $(dirname $LOCKFILE)     || mkdir -p $(dirname $LOCKFILE)\n",
        path = exec_path.display(),
        name = def.name,
        description = def.description,
    )
}

/// Status helper for hosts with LSB functions, preferring `status_of_proc`
/// where the installed LSB version provides it.
const LSB_STATUS_FN: &str = "\
if type status_of_proc &>/dev/null; then # newer LSB versions only
    get_status() {
        status_of_proc $([ -e $PIDFILE ] && echo -p $PIDFILE) \"$CMD\" \"$NAME\"
    }
else
    get_status() {
        pidofproc $([ -e $PIDFILE ] && echo -p $PIDFILE) \"$CMD\" >/dev/null
        RETVAL=$?
        if [ $RETVAL -eq 0 ]; then
            log_success_msg \"$NAME is running\"
        elif [ $RETVAL -eq 4 ]; then
            log_failure_msg \"could not access PID file for $NAME\"
        else
            log_failure_msg \"$NAME is not running\"
        fi
        return $RETVAL
    }
fi
";

/// Redhat fragment: delegate backgrounding and pidfile management to the
/// host's daemon/status/killproc helpers.
fn redhat_body(def: &ServiceDefinition) -> String {
    let user = def
        .user_name
        .as_deref()
        .filter(|u| !u.is_empty())
        .map(|u| format!("--user={} ", sh_quote(u)))
        .unwrap_or_default();

    format!(
        "get_status() {{\n\
         \x20   status -p \"$PIDFILE\" \"$CMD\"\n\
         }}\n\
         \n\
         start() {{\n\
         \x20   get_status &>/dev/null && return 0\n\
         \x20   echo -n $\"Starting ${{DESC}}: \"\n\
         \x20   daemon --pidfile=\"$PIDFILE\" {user}\\\n\
         \x20       \"$CMD{args} </dev/null >$STDOUTLOG 2>$STDERRLOG & echo \\$! > $PIDFILE\"\n\
         \x20   sleep 0.5 # wait briefly to see if service failed to start\n\
         \x20   get_status &>/dev/null && success || failure\n\
         \x20   RETVAL=$?\n\
         \x20   [ $RETVAL -eq 0 ] && touch \"$LOCKFILE\" || rm -f \"$PIDFILE\"\n\
         \x20   echo\n\
         \x20   return $RETVAL\n\
         }}\n\
         \n\
         stop() {{\n\
         \x20   get_status &>/dev/null || return 0\n\
         \x20   echo -n $\"Stopping ${{DESC}}: \"\n\
         \x20   killproc -p \"$PIDFILE\" \"$CMD\" -TERM\n\
         \x20   RETVAL=$?\n\
         \x20   [ $RETVAL -eq 0 ] && rm -f \"$LOCKFILE\" \"$PIDFILE\" || rm -f \"$PIDFILE\"\n\
         \x20   echo\n\
         \x20   return $RETVAL\n\
         }}\n",
        user = user,
        args = dquoted_args(def),
    )
}

/// Debian fragment: delegate to start-stop-daemon, passing chroot/chdir/chuid
/// only when the corresponding definition field is non-empty.
fn debian_body(def: &ServiceDefinition) -> String {
    let mut extra = String::new();
    if let Some(chroot) = def.chroot.as_deref().filter(|c| !c.is_empty()) {
        extra.push_str(&format!("    --chroot {} \\\n", sh_quote(chroot)));
    }
    if let Some(dir) = def.working_directory.as_deref().filter(|d| !d.is_empty()) {
        extra.push_str(&format!("    --chdir {} \\\n", sh_quote(dir)));
    }
    if let Some(user) = def.user_name.as_deref().filter(|u| !u.is_empty()) {
        extra.push_str(&format!("    --chuid {} \\\n", sh_quote(user)));
    }

    format!(
        "{status}\n\
         start() {{\n\
         \x20   log_daemon_msg \"Starting ${{DESC}}\"\n\
         \x20   start-stop-daemon --start \\\n\
         {extra}\
         \x20   --pidfile \"$PIDFILE\" \\\n\
         \x20   --background \\\n\
         \x20   --make-pidfile \\\n\
         \x20   --exec \"$CMD\" --{args}\n\
         \x20   log_end_msg $?\n\
         }}\n\
         \n\
         stop() {{\n\
         \x20   log_daemon_msg \"Stopping ${{DESC}}\"\n\
         \x20   start-stop-daemon --stop --pidfile \"$PIDFILE\" --quiet\n\
         \x20   RETVAL=$?\n\
         \x20   rm -f \"$PIDFILE\"\n\
         \x20   log_end_msg $RETVAL\n\
         }}\n",
        status = LSB_STATUS_FN,
        extra = extra,
        args = quoted_args(def),
    )
}

/// Generic LSB fragment: background the process manually, write our own
/// pidfile, and poll status after a short delay to catch an immediate crash.
fn lsb_body(def: &ServiceDefinition) -> String {
    let chdir = def
        .working_directory
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| format!("    cd {}\n", sh_quote(d)))
        .unwrap_or_default();

    format!(
        "{status}\n\
         start() {{\n\
         \x20   get_status &>/dev/null && return 0\n\
         \x20   echo -n $\"Starting $DESC: ${{NAME}}\"\n\
         {chdir}\
         \x20   \"$CMD\"{args} </dev/null >\"$STDOUTLOG\" 2>\"$STDERRLOG\" &\n\
         \x20   echo $! > \"$PIDFILE\"\n\
         \x20   sleep 0.5 # wait briefly to see if service crashed\n\
         \x20   get_status &>/dev/null\n\
         \x20   RETVAL=$?\n\
         \x20   if [ $RETVAL -eq 0 ]; then\n\
         \x20       log_success_msg\n\
         \x20       touch \"$LOCKFILE\"\n\
         \x20   else\n\
         \x20       log_failure_msg\n\
         \x20       rm -f \"$PIDFILE\"\n\
         \x20   fi\n\
         \x20   return $RETVAL\n\
         }}\n\
         \n\
         stop() {{\n\
         \x20   get_status &>/dev/null || return 0\n\
         \x20   echo -n $\"Stopping ${{DESC}}: ${{NAME}}\"\n\
         \x20   killproc -p \"$PIDFILE\" \"$CMD\" -TERM\n\
         \x20   RETVAL=$?\n\
         \x20   if [ $RETVAL -eq 0 ]; then\n\
         \x20       log_success_msg\n\
         \x20       rm -f \"$LOCKFILE\"\n\
         \x20   else\n\
         \x20       log_failure_msg\n\
         \x20   fi\n\
         \x20   rm -f \"$PIDFILE\"\n\
         \x20   return $RETVAL\n\
         }}\n",
        status = LSB_STATUS_FN,
        chdir = chdir,
        args = quoted_args(def),
    )
}

/// Subcommand dispatch shared by every flavor, with LSB exit 2 on bad usage.
const DISPATCH: &str = "
case \"$1\" in
    start|stop)
        $1
        ;;
    restart|force-reload)
        stop
        start
        ;;
    status)
        get_status
        ;;
    *)
        echo $\"Usage: $0 {start|stop|status|restart|force-reload}\" >&2
        exit 2 # LSB: invalid or excess arguments
esac
";

/// Produces the full control-script text for a definition under `flavor`.
pub fn render(def: &ServiceDefinition, exec_path: &Path, flavor: Flavor) -> String {
    let body = match flavor {
        Flavor::Redhat => redhat_body(def),
        Flavor::Debian => debian_body(def),
        Flavor::Lsb => lsb_body(def),
    };

    format!(
        "#!/bin/bash\n{header}\n{prelude}\n{body}{dispatch}",
        header = header(def, flavor),
        prelude = prelude(def, exec_path),
        body = body,
        dispatch = DISPATCH,
    )
}
