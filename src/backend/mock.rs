//! Scriptable in-memory backend for tests.
//!
//! A `MockScript` decides where the call fails (if anywhere) and what the
//! backend returns. `MockStats` records opens, closes, and every bind so tests
//! can check that connections are always released.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use super::{
    Backend, BackendError, Connection, PreparedCall, ResultCursor, Statement, ValueReader,
};
use crate::call::{BoundValue, Value, ValueKind};

#[derive(Debug, Clone, Default)]
pub struct MockScript {
    pub fail_connect: bool,
    pub fail_prepare: bool,
    /// 1-based position whose bind the backend rejects.
    pub reject_bind_at: Option<usize>,
    /// Message for an execution-time rejection (e.g. a constraint violation).
    pub reject_execute: Option<String>,
    /// Procedure output values by 1-based parameter position.
    pub outputs: HashMap<usize, Option<Value>>,
    /// Function result rows.
    pub rows: Vec<Vec<Option<Value>>>,
    /// Row count reported by `move_to_last`, when it should disagree with `rows`.
    pub probed_rows: Option<usize>,
    /// Fail `next_row` once this many rows have been produced.
    pub fail_next_after: Option<usize>,
}

#[derive(Debug, Default)]
pub struct MockStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
    executed: AtomicUsize,
    prepared: Mutex<Vec<PreparedCall>>,
    bound: Mutex<Vec<(usize, BoundValue)>>,
    registered: Mutex<Vec<(usize, ValueKind)>>,
}

impl MockStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    pub fn prepared(&self) -> Vec<PreparedCall> {
        self.prepared.lock().clone()
    }

    pub fn bound(&self) -> Vec<(usize, BoundValue)> {
        self.bound.lock().clone()
    }

    pub fn registered(&self) -> Vec<(usize, ValueKind)> {
        self.registered.lock().clone()
    }
}

pub struct MockBackend {
    script: MockScript,
    stats: Arc<MockStats>,
}

impl MockBackend {
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            stats: Arc::new(MockStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }
}

impl Backend for MockBackend {
    fn connect(&self) -> Result<Box<dyn Connection>, BackendError> {
        if self.script.fail_connect {
            return Err(BackendError::Connect {
                message: "connection refused".to_string(),
            });
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            script: self.script.clone(),
            stats: Arc::clone(&self.stats),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "Mock"
    }
}

struct MockConnection {
    script: MockScript,
    stats: Arc<MockStats>,
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl Connection for MockConnection {
    fn prepare<'c>(
        &'c mut self,
        call: &PreparedCall,
    ) -> Result<Box<dyn Statement + 'c>, BackendError> {
        if self.script.fail_prepare {
            return Err(BackendError::Prepare {
                call: call.template.clone(),
                message: "routine does not exist".to_string(),
            });
        }
        self.stats.prepared.lock().push(call.clone());
        Ok(Box::new(MockStatement {
            script: &self.script,
            stats: self.stats.as_ref(),
        }))
    }
}

struct MockStatement<'c> {
    script: &'c MockScript,
    stats: &'c MockStats,
}

impl MockStatement<'_> {
    fn run(&self) -> Result<(), BackendError> {
        self.stats.executed.fetch_add(1, Ordering::SeqCst);
        match &self.script.reject_execute {
            Some(message) => Err(BackendError::Execute {
                code: Some("23505".to_string()),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Statement for MockStatement<'_> {
    fn bind(&mut self, position: usize, value: BoundValue) -> Result<(), BackendError> {
        if self.script.reject_bind_at == Some(position) {
            return Err(BackendError::Bind {
                position,
                message: "value out of range".to_string(),
            });
        }
        self.stats.bound.lock().push((position, value));
        Ok(())
    }

    fn register_output(&mut self, position: usize, kind: ValueKind) -> Result<(), BackendError> {
        self.stats.registered.lock().push((position, kind));
        Ok(())
    }

    fn execute_call(&mut self) -> Result<Box<dyn ValueReader + '_>, BackendError> {
        self.run()?;
        Ok(Box::new(MockOutputs {
            outputs: &self.script.outputs,
        }))
    }

    fn execute_query(&mut self) -> Result<Box<dyn ResultCursor + '_>, BackendError> {
        self.run()?;
        Ok(Box::new(MockCursor {
            rows: &self.script.rows,
            probed_rows: self.script.probed_rows,
            fail_next_after: self.script.fail_next_after,
            position: 0,
            produced: 0,
        }))
    }
}

struct MockOutputs<'c> {
    outputs: &'c HashMap<usize, Option<Value>>,
}

impl MockOutputs<'_> {
    fn cell(&self, position: usize) -> Result<Option<&Value>, BackendError> {
        self.outputs
            .get(&position)
            .map(Option::as_ref)
            .ok_or_else(|| BackendError::Read {
                position,
                message: "not an output parameter".to_string(),
            })
    }
}

struct MockCursor<'c> {
    rows: &'c [Vec<Option<Value>>],
    probed_rows: Option<usize>,
    fail_next_after: Option<usize>,
    /// 0 is before the first row; `rows.len() + 1` is after the last.
    position: usize,
    produced: usize,
}

impl MockCursor<'_> {
    fn cell(&self, column: usize) -> Result<Option<&Value>, BackendError> {
        let row = self
            .position
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .ok_or_else(|| BackendError::Cursor {
                message: "no current row".to_string(),
            })?;
        row_cell(row, column)
    }
}

impl ResultCursor for MockCursor<'_> {
    fn move_to_last(&mut self) -> Result<usize, BackendError> {
        self.position = self.rows.len();
        Ok(self.probed_rows.unwrap_or(self.rows.len()))
    }

    fn before_first(&mut self) -> Result<(), BackendError> {
        self.position = 0;
        Ok(())
    }

    fn next_row(&mut self) -> Result<bool, BackendError> {
        if self.fail_next_after == Some(self.produced) {
            return Err(BackendError::Cursor {
                message: "connection reset while fetching".to_string(),
            });
        }
        if self.position <= self.rows.len() {
            self.position += 1;
        }
        let on_row = self.position <= self.rows.len();
        if on_row {
            self.produced += 1;
        }
        Ok(on_row)
    }
}

/// A single in-memory row, readable by 1-based column.
#[derive(Debug, Clone, Default)]
pub struct MockRow {
    cells: Vec<Option<Value>>,
}

impl MockRow {
    pub fn new(cells: Vec<Option<Value>>) -> Self {
        Self { cells }
    }
}

fn row_cell(row: &[Option<Value>], column: usize) -> Result<Option<&Value>, BackendError> {
    column
        .checked_sub(1)
        .and_then(|i| row.get(i))
        .map(Option::as_ref)
        .ok_or_else(|| BackendError::Read {
            position: column,
            message: "column index out of range".to_string(),
        })
}

fn wrong_type(position: usize, wanted: &str, found: &Value) -> BackendError {
    BackendError::Read {
        position,
        message: format!("cannot read {} as {wanted}", found.type_name()),
    }
}

/// Implements the typed getters over a `cell(position)` accessor.
macro_rules! mock_reader {
    ($ty:ty) => {
        impl ValueReader for $ty {
            fn read_int(&self, position: usize) -> Result<Option<i32>, BackendError> {
                match self.cell(position)? {
                    None => Ok(None),
                    Some(Value::Integer(i)) => Ok(Some(*i)),
                    Some(other) => Err(wrong_type(position, "integer", other)),
                }
            }

            fn read_decimal(&self, position: usize) -> Result<Option<Decimal>, BackendError> {
                match self.cell(position)? {
                    None => Ok(None),
                    Some(Value::Decimal(d)) => Ok(Some(*d)),
                    Some(Value::Integer(i)) => Ok(Some(Decimal::from(*i))),
                    Some(other) => Err(wrong_type(position, "decimal", other)),
                }
            }

            fn read_text(&self, position: usize) -> Result<Option<String>, BackendError> {
                match self.cell(position)? {
                    None => Ok(None),
                    Some(Value::Text(s)) => Ok(Some(s.clone())),
                    Some(Value::Char(c)) => Ok(Some(c.to_string())),
                    Some(other) => Err(wrong_type(position, "text", other)),
                }
            }

            fn read_bool(&self, position: usize) -> Result<Option<bool>, BackendError> {
                match self.cell(position)? {
                    None => Ok(None),
                    Some(Value::Boolean(b)) => Ok(Some(*b)),
                    Some(other) => Err(wrong_type(position, "boolean", other)),
                }
            }

            fn read_bytes(&self, position: usize) -> Result<Option<Vec<u8>>, BackendError> {
                match self.cell(position)? {
                    None => Ok(None),
                    Some(Value::Binary(bytes)) => Ok(Some(bytes.clone())),
                    Some(other) => Err(wrong_type(position, "binary", other)),
                }
            }

            fn read_date(&self, position: usize) -> Result<Option<NaiveDate>, BackendError> {
                match self.cell(position)? {
                    None => Ok(None),
                    Some(Value::Date(d)) => Ok(Some(*d)),
                    Some(other) => Err(wrong_type(position, "date", other)),
                }
            }
        }
    };
}

impl MockRow {
    fn cell(&self, position: usize) -> Result<Option<&Value>, BackendError> {
        row_cell(&self.cells, position)
    }
}

mock_reader!(MockRow);
mock_reader!(MockOutputs<'_>);
mock_reader!(MockCursor<'_>);
