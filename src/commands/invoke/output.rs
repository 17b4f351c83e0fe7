//! Output formatting for invoke command results.

use super::execute::InvokeResult;
use crate::call::ResultEnvelope;
use crate::output::{Outputable, render_columns};

impl Outputable for InvokeResult {
    fn to_table(&self) -> String {
        let rows = match &self.envelope {
            ResultEnvelope::Success { rows } => rows,
            _ => {
                let message = self.message.as_deref().unwrap_or_default();
                return format!("{}: {message}", self.routine);
            }
        };

        if self.columns.is_empty() {
            return format!("{}: done.", self.routine);
        }
        if rows.is_empty() {
            return format!("{}: no rows.", self.routine);
        }

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Some(value) => value.to_string(),
                        None => "NULL".to_string(),
                    })
                    .collect()
            })
            .collect();
        let headers: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let noun = if rows.len() == 1 { "row" } else { "rows" };

        format!(
            "{} ({} {noun}):\n\n{}",
            self.routine,
            rows.len(),
            render_columns(&headers, &cells)
        )
    }
}
