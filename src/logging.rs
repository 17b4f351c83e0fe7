//! Subscriber setup for `tracing` events.
//!
//! Events go to stderr, or are appended to the configured log file with
//! ANSI colors off. `RUST_LOG` overrides the configured level.

use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// A `MakeWriter` that serializes writes to one shared file.
#[derive(Clone)]
struct SharedFileWriter {
    file: Arc<Mutex<File>>,
}

impl SharedFileWriter {
    fn new(file: File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }
}

impl<'a> MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileGuard {
            guard: self.file.lock(),
        }
    }
}

/// Holds the file lock for one event.
struct SharedFileGuard<'a> {
    guard: MutexGuard<'a, File>,
}

impl io::Write for SharedFileGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut *self.guard, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut *self.guard)
    }
}

/// Filter from `RUST_LOG`, falling back to the configured level.
fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber. Call once, at startup.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global
/// subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let file_layer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(SharedFileWriter::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = file_layer
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_shared_file_writer_appends() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let writer = SharedFileWriter::new(temp.reopen().unwrap());

        writer.make_writer().write_all(b"first\n").unwrap();
        writer.clone().make_writer().write_all(b"second\n").unwrap();

        let mut contents = String::new();
        temp.reopen().unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn test_file_layer_captures_error_log_events() {
        use crate::error_log::{ErrorLog, TracingErrorLog};

        let temp = tempfile::NamedTempFile::new().unwrap();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SharedFileWriter::new(temp.reopen().unwrap())),
        );

        tracing::subscriber::with_default(subscriber, || {
            TracingErrorLog.log_error("CallExecutor", "Return value 1 invalid", false);
        });

        let mut contents = String::new();
        temp.reopen().unwrap().read_to_string(&mut contents).unwrap();
        assert!(contents.contains("ERROR"));
        assert!(contents.contains("Return value 1 invalid"));
        assert!(contents.contains("context=\"CallExecutor\""));
        assert!(contents.contains("fatal=false"));
    }
}
