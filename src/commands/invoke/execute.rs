use std::error::Error;

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::InvokeCmd;
use crate::call::{CallDescriptor, JsonValueError, ResultEnvelope, Value, ValueKind};
use crate::commands::{Context, Execute};

/// Result of one invocation
#[derive(Debug, Serialize)]
pub struct InvokeResult {
    pub routine: String,
    /// Output parameter names for procedures, column kinds for functions.
    pub columns: Vec<String>,
    #[serde(flatten)]
    pub envelope: ResultEnvelope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Parse one command-line argument as a value of `kind`.
///
/// `null` is SQL NULL. Integers and booleans are read as JSON; the other
/// kinds take a JSON string or the bare text. Decimals stay text so that
/// the codec sees every digit.
pub(crate) fn parse_arg(kind: ValueKind, raw: &str) -> Result<Option<Value>, JsonValueError> {
    let json = match serde_json::from_str::<JsonValue>(raw) {
        Ok(json @ (JsonValue::Null | JsonValue::String(_))) => json,
        Ok(json) if matches!(kind, ValueKind::Integer | ValueKind::Boolean) => json,
        _ => JsonValue::String(raw.to_string()),
    };
    Value::from_json(kind, &json)
}

fn result_columns(descriptor: &CallDescriptor) -> Vec<String> {
    match descriptor.output_positions() {
        Some(positions) => positions
            .iter()
            .filter_map(|p| descriptor.param_names().get(p - 1).cloned())
            .collect(),
        None => descriptor
            .return_column_kinds()
            .map(|kinds| kinds.iter().map(ToString::to_string).collect())
            .unwrap_or_default(),
    }
}

impl Execute for InvokeCmd {
    type Output = InvokeResult;

    fn execute(self, ctx: &Context) -> Result<Self::Output, Box<dyn Error>> {
        let entry = ctx
            .catalog()
            .get(&self.routine)
            .ok_or_else(|| format!("Unknown routine '{}'", self.routine))?;
        let descriptor = &entry.descriptor;

        let inputs: Vec<usize> = (0..descriptor.param_count())
            .filter(|&index| !descriptor.is_output(index))
            .collect();
        if self.values.len() > inputs.len() {
            return Err(format!(
                "{} takes {} input values, got {}",
                entry.name,
                inputs.len(),
                self.values.len()
            )
            .into());
        }

        let mut values: Vec<Option<Value>> = vec![None; descriptor.param_count()];
        for (&index, raw) in inputs.iter().zip(&self.values) {
            let kind = descriptor.param_kinds()[index];
            values[index] = parse_arg(kind, raw).map_err(|e| {
                format!(
                    "Value {} ({}) for {}: {e}",
                    index + 1,
                    descriptor.param_names()[index],
                    entry.name
                )
            })?;
        }

        let executor = ctx.executor()?;
        let envelope = executor.invoke(descriptor, &values);

        Ok(InvokeResult {
            routine: entry.name.to_string(),
            columns: result_columns(descriptor),
            message: envelope.user_message(),
            envelope,
        })
    }
}
