//! Error-log collaborator used by the executor and at startup.

/// Sink for errors that must be recorded for diagnosis.
///
/// `fatal` errors terminate the process after the log attempt.
pub trait ErrorLog: Send + Sync {
    fn log_error(&self, context: &str, message: &str, fatal: bool);
}

/// `ErrorLog` backed by `tracing` events.
///
/// Where the events end up is decided by the installed subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorLog;

impl ErrorLog for TracingErrorLog {
    fn log_error(&self, context: &str, message: &str, fatal: bool) {
        tracing::error!(context, fatal, "{message}");
        if fatal {
            std::process::exit(1);
        }
    }
}
