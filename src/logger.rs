//! Logging channel selection for the embedded program.
//!
//! Interactive runs get a console logger; detached runs (no terminal, i.e.
//! launched by init) get a syslog logger keyed by service name. These carry
//! the *program's* operational messages; the crate's own diagnostics go
//! through `tracing`.

use std::ffi::CString;
use std::io;

use crossterm::tty::IsTty;

/// Leveled logging channel handed to the embedded program.
pub trait ServiceLogger: Send {
    /// Logs an error-level message.
    fn error(&self, message: &str);

    /// Logs a warning-level message.
    fn warning(&self, message: &str);

    /// Logs an info-level message.
    fn info(&self, message: &str);
}

/// Logger for interactive runs, writing leveled lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogger;

impl ServiceLogger for ConsoleLogger {
    fn error(&self, message: &str) {
        eprintln!("ERROR: {message}");
    }

    fn warning(&self, message: &str) {
        eprintln!("WARNING: {message}");
    }

    fn info(&self, message: &str) {
        eprintln!("INFO: {message}");
    }
}

/// Logger routing to the system log, identified by the service name.
pub struct SysLogger {
    // openlog keeps a pointer to the ident for the connection's lifetime,
    // so the CString must live as long as this logger.
    ident: CString,
}

impl SysLogger {
    /// Opens a syslog connection identified by `name`.
    pub fn new(name: &str) -> Self {
        let ident = CString::new(name.replace('\0', ""))
            .expect("NUL bytes stripped from ident");
        unsafe {
            libc::openlog(ident.as_ptr(), libc::LOG_PID, libc::LOG_DAEMON);
        }
        Self { ident }
    }

    /// The ident this connection logs under.
    pub fn ident(&self) -> &std::ffi::CStr {
        &self.ident
    }

    fn log(&self, priority: libc::c_int, message: &str) {
        let Ok(text) = CString::new(message.replace('\0', "")) else {
            return;
        };
        unsafe {
            libc::syslog(priority, c"%s".as_ptr(), text.as_ptr());
        }
    }
}

impl ServiceLogger for SysLogger {
    fn error(&self, message: &str) {
        self.log(libc::LOG_ERR, message);
    }

    fn warning(&self, message: &str) {
        self.log(libc::LOG_WARNING, message);
    }

    fn info(&self, message: &str) {
        self.log(libc::LOG_INFO, message);
    }
}

impl Drop for SysLogger {
    fn drop(&mut self) {
        unsafe {
            libc::closelog();
        }
    }
}

/// Chooses the logging channel for this process: console when stderr has an
/// attached terminal, syslog keyed by `service_name` otherwise.
pub fn select(service_name: &str) -> Box<dyn ServiceLogger> {
    if io::stderr().is_tty() {
        Box::new(ConsoleLogger)
    } else {
        Box::new(SysLogger::new(service_name))
    }
}
