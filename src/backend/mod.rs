//! Backend seam for invoking routines.
//!
//! The executor talks to a database only through these traits:
//! - `Backend` hands out one fresh `Connection` per call
//! - `Connection` prepares a `Statement` from a call template
//! - `Statement` accepts bound values and output registrations, then executes
//! - `ValueReader`/`ResultCursor` expose typed, 1-based reads of the results
//!
//! Dropping a `Connection` releases it. Implementations never pool or reuse
//! connections. Backend failures surface as `BackendError` and are classified
//! by the executor; they never reach business code.

pub mod postgres;

#[cfg(test)]
pub mod mock;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::call::{BoundValue, ValueKind};

pub use self::postgres::PostgresBackend;

/// Backend failure, tagged by where it happened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to connect to the database: {message}")]
    Connect { message: String },

    #[error("Failed to prepare '{call}': {message}")]
    Prepare { call: String, message: String },

    #[error("Parameter {position} rejected: {message}")]
    Bind { position: usize, message: String },

    #[error("Execution failed: {message}")]
    Execute {
        /// Backend-specific error code (SQLSTATE on PostgreSQL), if any.
        code: Option<String>,
        message: String,
    },

    #[error("Could not read value at position {position}: {message}")]
    Read { position: usize, message: String },

    #[error("Cursor error: {message}")]
    Cursor { message: String },
}

/// Whether a prepared call runs a procedure or a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Procedure,
    Function,
}

/// A call template ready to prepare, with `?` positional placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    pub template: String,
    pub mode: CallMode,
    pub param_count: usize,
}

/// A database that can open connections for routine calls.
pub trait Backend: Send + Sync {
    /// Open a new connection. The connection is closed when dropped.
    fn connect(&self) -> Result<Box<dyn Connection>, BackendError>;

    /// Get the backend name for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// One open connection, owned by a single call.
pub trait Connection {
    fn prepare<'c>(&'c mut self, call: &PreparedCall)
    -> Result<Box<dyn Statement + 'c>, BackendError>;
}

/// A prepared routine call.
///
/// Positions are 1-based, matching the placeholders of the template.
pub trait Statement {
    fn bind(&mut self, position: usize, value: BoundValue) -> Result<(), BackendError>;

    /// Mark a procedure parameter as output-mode instead of binding a value.
    fn register_output(&mut self, position: usize, kind: ValueKind) -> Result<(), BackendError>;

    /// Execute a procedure call, exposing its output parameters by position.
    fn execute_call(&mut self) -> Result<Box<dyn ValueReader + '_>, BackendError>;

    /// Execute a function call, exposing its result rows.
    fn execute_query(&mut self) -> Result<Box<dyn ResultCursor + '_>, BackendError>;
}

/// Typed reads of one result position. Backend NULL reads as `None`.
pub trait ValueReader {
    fn read_int(&self, position: usize) -> Result<Option<i32>, BackendError>;
    fn read_decimal(&self, position: usize) -> Result<Option<Decimal>, BackendError>;
    fn read_text(&self, position: usize) -> Result<Option<String>, BackendError>;
    fn read_bool(&self, position: usize) -> Result<Option<bool>, BackendError>;
    fn read_bytes(&self, position: usize) -> Result<Option<Vec<u8>>, BackendError>;
    fn read_date(&self, position: usize) -> Result<Option<NaiveDate>, BackendError>;
}

/// A scrollable cursor over function result rows.
///
/// Reads through `ValueReader` apply to the current row, with positions
/// naming 1-based columns.
pub trait ResultCursor: ValueReader {
    /// Move to the last row and return its 1-based row number (0 when empty).
    fn move_to_last(&mut self) -> Result<usize, BackendError>;

    /// Move to just before the first row.
    fn before_first(&mut self) -> Result<(), BackendError>;

    /// Advance to the next row, returning false once past the last row.
    fn next_row(&mut self) -> Result<bool, BackendError>;
}
