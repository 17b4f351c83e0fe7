//! Per-call protocol: connect, bind, execute, read, classify, release.
//!
//! Every failure is recovered into a `ResultEnvelope`. The connection is owned
//! by `run` and dropped on every return path, so it is released whichever
//! phase failed.

use std::sync::Arc;

use tracing::debug;

use super::codec::{self, CodecError};
use super::descriptor::{CallDescriptor, ReturnShape};
use super::envelope::{ResultEnvelope, Row};
use super::kind::Value;
use crate::backend::{Backend, BackendError, ResultCursor, Statement, ValueReader};
use crate::error_log::ErrorLog;

/// Phases of one invocation, reported in debug events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallPhase {
    Connecting,
    Binding,
    Executing,
    ReadingResults,
    Done,
}

/// A classified failure, before it is turned into an envelope.
#[derive(Debug)]
enum CallFailure {
    /// Connect or prepare failed.
    Connection(BackendError),
    /// Bind phase failed at a 0-based parameter index.
    Param { index: usize, source: CodecError },
    /// The backend failed with no bind or read index recorded.
    Rejected(BackendError),
    /// Read phase failed at a 0-based parameter or column index.
    Return { index: usize, source: CodecError },
    /// A scalar function produced no row.
    NoRow,
}

/// Invokes routines described by `CallDescriptor`s against one backend.
///
/// Holds no per-call state; one executor can serve any number of threads.
#[derive(Clone)]
pub struct CallExecutor {
    backend: Arc<dyn Backend>,
    log: Arc<dyn ErrorLog>,
}

impl CallExecutor {
    pub fn new(backend: Arc<dyn Backend>, log: Arc<dyn ErrorLog>) -> Self {
        Self { backend, log }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Invoke the routine with `values` in declared parameter order.
    ///
    /// `None` (or a missing trailing value) is an absent value. Values given
    /// for output-mode parameters are ignored.
    pub fn invoke(&self, descriptor: &CallDescriptor, values: &[Option<Value>]) -> ResultEnvelope {
        if values.len() > descriptor.param_count() {
            debug!(
                call = descriptor.call_template(),
                given = values.len(),
                declared = descriptor.param_count(),
                "ignoring extra values"
            );
        }

        match self.run(descriptor, values) {
            Ok(rows) => {
                debug!(phase = ?CallPhase::Done, rows = rows.len(), "call succeeded");
                ResultEnvelope::Success { rows }
            }
            Err(failure) => self.classify(descriptor, failure),
        }
    }

    fn run(&self, descriptor: &CallDescriptor, values: &[Option<Value>]) -> Result<Vec<Row>, CallFailure> {
        debug!(phase = ?CallPhase::Connecting, call = descriptor.call_template());
        let mut connection = self.backend.connect().map_err(CallFailure::Connection)?;
        let mut statement = connection
            .prepare(&descriptor.prepared_call())
            .map_err(CallFailure::Connection)?;

        debug!(phase = ?CallPhase::Binding);
        bind_params(statement.as_mut(), descriptor, values)?;

        debug!(phase = ?CallPhase::Executing);
        if descriptor.is_procedure() {
            let outputs = statement.execute_call().map_err(CallFailure::Rejected)?;
            debug!(phase = ?CallPhase::ReadingResults);
            read_outputs(descriptor, outputs.as_ref())
        } else {
            let mut cursor = statement.execute_query().map_err(CallFailure::Rejected)?;
            debug!(phase = ?CallPhase::ReadingResults);
            match descriptor.return_shape() {
                ReturnShape::Scalar => read_scalar(descriptor, cursor.as_mut()),
                ReturnShape::Tabular => read_rows(descriptor, cursor.as_mut()),
            }
        }
    }

    fn classify(&self, descriptor: &CallDescriptor, failure: CallFailure) -> ResultEnvelope {
        let call = descriptor.call_template();
        match failure {
            CallFailure::Connection(err) => {
                self.log.log_error(
                    "CallExecutor",
                    &format!("Connection failure for call \"{call}\": {err}"),
                    false,
                );
                ResultEnvelope::ConnectionFailure
            }
            CallFailure::Param { index, source } => {
                debug!(call, index, error = %source, "parameter rejected");
                ResultEnvelope::ParamFailure {
                    index,
                    name: descriptor.param_names()[index].clone(),
                }
            }
            CallFailure::Rejected(err) => {
                debug!(call, error = %err, "request rejected by backend");
                ResultEnvelope::RequestRejected
            }
            CallFailure::Return { index, source } => {
                let message = if descriptor.is_procedure() {
                    format!("Return value {} invalid for call \"{call}\": {source}", index + 1)
                } else {
                    format!(
                        "Value from cell in column {} invalid for call \"{call}\": {source}",
                        index + 1
                    )
                };
                self.log.log_error("CallExecutor", &message, source.is_fatal());
                ResultEnvelope::ReturnFailure { index }
            }
            CallFailure::NoRow => {
                self.log.log_error(
                    "CallExecutor",
                    &format!("Scalar call \"{call}\" returned no row"),
                    false,
                );
                ResultEnvelope::ReturnFailure { index: 0 }
            }
        }
    }
}

fn bind_params(
    statement: &mut dyn Statement,
    descriptor: &CallDescriptor,
    values: &[Option<Value>],
) -> Result<(), CallFailure> {
    for (index, &kind) in descriptor.param_kinds().iter().enumerate() {
        let position = index + 1;
        let result = if descriptor.is_output(index) {
            statement
                .register_output(position, kind)
                .map_err(CodecError::from)
        } else {
            let value = values.get(index).and_then(Option::as_ref);
            codec::encode(kind, value, descriptor.param_nullable()[index])
                .and_then(|bound| statement.bind(position, bound).map_err(CodecError::from))
        };
        result.map_err(|source| CallFailure::Param { index, source })?;
    }
    Ok(())
}

/// Decode procedure outputs in declared order into one tuple.
fn read_outputs(descriptor: &CallDescriptor, reader: &dyn ValueReader) -> Result<Vec<Row>, CallFailure> {
    let positions = descriptor.output_positions().unwrap_or_default();
    let mut row = Vec::with_capacity(positions.len());
    for &position in positions {
        let index = position - 1;
        let kind = descriptor.param_kinds()[index];
        let value = codec::decode(kind, reader, position)
            .map_err(|source| CallFailure::Return { index, source })?;
        row.push(value);
    }
    Ok(vec![row])
}

fn read_scalar(descriptor: &CallDescriptor, cursor: &mut dyn ResultCursor) -> Result<Vec<Row>, CallFailure> {
    let kind = descriptor.return_column_kinds().unwrap_or_default()[0];
    if !cursor.next_row().map_err(CallFailure::Rejected)? {
        return Err(CallFailure::NoRow);
    }
    let value = codec::decode(kind, &*cursor, 1)
        .map_err(|source| CallFailure::Return { index: 0, source })?;
    Ok(vec![vec![value]])
}

/// Decode every row of a tabular result.
///
/// The row count is probed first. Decoding stops at the probed count or when
/// the cursor runs out, whichever comes first; rows beyond that are dropped.
fn read_rows(descriptor: &CallDescriptor, cursor: &mut dyn ResultCursor) -> Result<Vec<Row>, CallFailure> {
    let kinds = descriptor.return_column_kinds().unwrap_or_default();
    let probed = cursor.move_to_last().map_err(CallFailure::Rejected)?;
    cursor.before_first().map_err(CallFailure::Rejected)?;

    let mut rows = Vec::with_capacity(probed);
    let mut last_column: Option<usize> = None;
    while rows.len() < probed {
        let advanced = cursor.next_row().map_err(|err| match last_column {
            Some(index) => CallFailure::Return {
                index,
                source: err.into(),
            },
            None => CallFailure::Rejected(err),
        })?;
        if !advanced {
            break;
        }

        let mut row = Vec::with_capacity(kinds.len());
        for (index, &kind) in kinds.iter().enumerate() {
            last_column = Some(index);
            let value = codec::decode(kind, &*cursor, index + 1)
                .map_err(|source| CallFailure::Return { index, source })?;
            row.push(value);
        }
        rows.push(row);
    }

    if rows.len() < probed {
        debug!(probed, decoded = rows.len(), "cursor ended before probed row count");
    }
    Ok(rows)
}
