//! Row buffers usable as one tabular routine parameter.
//!
//! A `TableParameter` is mutated from one thread (typically UI events) while a
//! request thread takes a `TableSnapshot` to pass to the executor. Every
//! operation takes the instance's single lock, so a snapshot is atomic with
//! respect to concurrent adds and removes. No operation holds more than one
//! lock.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value as JsonValue};

use super::kind::{Value, ValueKind};

/// A fixed-shape row of a concrete tabular parameter type.
pub trait TableRow: Clone + Send {
    /// Backend name of the tabular type.
    const TYPE_NAME: &'static str;

    /// Column names and kinds, in order.
    const COLUMNS: &'static [(&'static str, ValueKind)];

    /// Cell values in `COLUMNS` order.
    fn values(&self) -> Vec<Option<Value>>;
}

/// Immutable copy of a table's rows, cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    inner: Arc<SnapshotData>,
}

#[derive(Debug, PartialEq)]
struct SnapshotData {
    type_name: String,
    columns: Vec<(String, ValueKind)>,
    rows: Vec<Vec<Option<Value>>>,
}

impl TableSnapshot {
    pub fn new(
        type_name: impl Into<String>,
        columns: Vec<(String, ValueKind)>,
        rows: Vec<Vec<Option<Value>>>,
    ) -> Self {
        Self {
            inner: Arc::new(SnapshotData {
                type_name: type_name.into(),
                columns,
                rows,
            }),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    pub fn columns(&self) -> &[(String, ValueKind)] {
        &self.inner.columns
    }

    pub fn rows(&self) -> &[Vec<Option<Value>>] {
        &self.inner.rows
    }

    pub fn len(&self) -> usize {
        self.inner.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.rows.is_empty()
    }

    /// Render as a JSON array of objects keyed by column name.
    ///
    /// Missing trailing cells and NULL cells both render as JSON `null`.
    pub fn to_json(&self) -> JsonValue {
        let rows = self
            .rows()
            .iter()
            .map(|row| {
                let mut object = Map::new();
                for (i, (name, _)) in self.columns().iter().enumerate() {
                    let cell = row
                        .get(i)
                        .and_then(Option::as_ref)
                        .map(Value::to_json)
                        .unwrap_or(JsonValue::Null);
                    object.insert(name.clone(), cell);
                }
                JsonValue::Object(object)
            })
            .collect();
        JsonValue::Array(rows)
    }
}

/// A lock-guarded row buffer of one tabular shape.
#[derive(Debug)]
pub struct TableParameter<R: TableRow> {
    rows: Mutex<Vec<R>>,
}

impl<R: TableRow> Default for TableParameter<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: TableRow> TableParameter<R> {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn add_row(&self, row: R) {
        self.rows.lock().push(row);
    }

    /// Remove the first row matching `predicate`.
    ///
    /// Returns false when nothing matched, which happens routinely when
    /// duplicate UI events remove the same row twice.
    pub fn remove_where<F>(&self, predicate: F) -> bool
    where
        F: Fn(&R) -> bool,
    {
        let mut rows = self.rows.lock();
        match rows.iter().position(predicate) {
            Some(index) => {
                rows.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn item_count(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn clear(&self) {
        self.rows.lock().clear();
    }

    /// Copy of the current rows.
    pub fn rows(&self) -> Vec<R> {
        self.rows.lock().clone()
    }

    pub fn snapshot(&self) -> TableSnapshot {
        Self::snapshot_of(&self.rows.lock())
    }

    /// Snapshot of rows copied out earlier with `rows()`.
    pub fn snapshot_of(rows: &[R]) -> TableSnapshot {
        let columns = R::COLUMNS
            .iter()
            .map(|(name, kind)| (name.to_string(), *kind))
            .collect();
        TableSnapshot::new(R::TYPE_NAME, columns, rows.iter().map(R::values).collect())
    }

    /// Remove one equal row for each entry of `taken`.
    ///
    /// Rows added since `taken` was copied stay in the table.
    pub fn remove_rows(&self, taken: &[R])
    where
        R: PartialEq,
    {
        let mut rows = self.rows.lock();
        for row in taken {
            if let Some(index) = rows.iter().position(|r| r == row) {
                rows.remove(index);
            }
        }
    }

    /// Snapshot wrapped as a parameter value.
    pub fn to_value(&self) -> Value {
        Value::Table(self.snapshot())
    }
}
