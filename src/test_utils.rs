//! Shared test utilities for executor, session, and command tests.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::backend::mock::{MockBackend, MockScript, MockStats};
use crate::call::CallExecutor;
use crate::catalog::Catalog;
use crate::commands::Context;
use crate::error_log::ErrorLog;

/// One `log_error` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedError {
    pub context: String,
    pub message: String,
    pub fatal: bool,
}

/// `ErrorLog` that records calls instead of emitting or exiting.
#[derive(Debug, Default)]
pub struct RecordingErrorLog {
    entries: Mutex<Vec<LoggedError>>,
}

impl RecordingErrorLog {
    pub fn entries(&self) -> Vec<LoggedError> {
        self.entries.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ErrorLog for RecordingErrorLog {
    fn log_error(&self, context: &str, message: &str, fatal: bool) {
        self.entries.lock().push(LoggedError {
            context: context.to_string(),
            message: message.to_string(),
            fatal,
        });
    }
}

/// An executor over a scripted mock backend, with handles on its stats and log.
pub struct MockHarness {
    pub executor: CallExecutor,
    pub stats: Arc<MockStats>,
    pub log: Arc<RecordingErrorLog>,
}

/// Build an executor whose backend follows `script`.
pub fn mock_executor(script: MockScript) -> MockHarness {
    let backend = MockBackend::new(script);
    let stats = backend.stats();
    let log = Arc::new(RecordingErrorLog::default());
    let executor = CallExecutor::new(Arc::new(backend), log.clone());
    MockHarness {
        executor,
        stats,
        log,
    }
}

/// A command context over a scripted mock backend and the full catalog.
pub struct ContextHarness {
    pub context: Context,
    pub stats: Arc<MockStats>,
    pub log: Arc<RecordingErrorLog>,
}

/// Build a command context whose backend follows `script`.
pub fn mock_context(script: MockScript) -> ContextHarness {
    let backend = MockBackend::new(script);
    let stats = backend.stats();
    let log = Arc::new(RecordingErrorLog::default());
    let catalog = Catalog::build().expect("Catalog should build");
    let context = Context::new(Arc::new(catalog), log.clone(), Ok(Arc::new(backend)));
    ContextHarness {
        context,
        stats,
        log,
    }
}

/// Create a temporary file containing the given content.
pub fn create_temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}
