//! The uniform result of every routine invocation.

use serde::Serialize;

use super::kind::Value;

/// One decoded tuple: a procedure's output values or one function result row.
pub type Row = Vec<Option<Value>>;

/// Outcome of one `CallExecutor::invoke`.
///
/// Callers branch on the variant only; backend error types never reach them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultEnvelope {
    /// Procedures carry exactly one tuple of output values; functions carry
    /// zero or more rows.
    Success { rows: Vec<Row> },
    /// A parameter was missing, malformed, or rejected at bind time.
    ParamFailure { index: usize, name: String },
    /// A result could not be decoded as declared. Always logged.
    ReturnFailure { index: usize },
    /// The backend declined the operation for data reasons.
    RequestRejected,
    /// No connection could be established or the call could not be prepared.
    ConnectionFailure,
}

impl ResultEnvelope {
    pub fn is_success(&self) -> bool {
        matches!(self, ResultEnvelope::Success { .. })
    }

    pub fn has_failed(&self) -> bool {
        !self.is_success()
    }

    /// True for a failure or a success without rows.
    pub fn is_empty(&self) -> bool {
        self.rows().is_none_or(<[Row]>::is_empty)
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            ResultEnvelope::Success { rows } => Some(rows),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            ResultEnvelope::Success { rows } => Some(rows),
            _ => None,
        }
    }

    pub fn first_row(&self) -> Option<&Row> {
        self.rows().and_then(<[Row]>::first)
    }

    /// First cell of the first row, for scalar functions.
    pub fn scalar(&self) -> Option<&Value> {
        self.first_row()
            .and_then(|row| row.first())
            .and_then(Option::as_ref)
    }

    /// Message to show an end user, or `None` on success.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ResultEnvelope::Success { .. } => None,
            ResultEnvelope::ParamFailure { name, .. } => Some(format!("Invalid {name}.")),
            ResultEnvelope::RequestRejected => Some(
                "Invalid input. This request is inconsistent with current data.".to_string(),
            ),
            ResultEnvelope::ReturnFailure { .. } => {
                Some("The data could not be retrieved from the database.".to_string())
            }
            ResultEnvelope::ConnectionFailure => {
                Some("The system could not complete the operation.".to_string())
            }
        }
    }
}
