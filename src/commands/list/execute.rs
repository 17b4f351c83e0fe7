use std::error::Error;

use serde::Serialize;

use super::{ListCmd, RoutineKind};
use crate::call::{CallDescriptor, ReturnShape, ValueKind};
use crate::commands::{Context, Execute};

/// One catalog routine, summarized
#[derive(Debug, Clone, Serialize)]
pub struct RoutineSummary {
    pub name: String,
    pub kind: RoutineKind,
    pub params: usize,
    pub returns: String,
}

/// Result of the list command execution
#[derive(Debug, Default, Serialize)]
pub struct ListResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub routines: Vec<RoutineSummary>,
}

fn kind_list(kinds: impl IntoIterator<Item = ValueKind>) -> String {
    kinds
        .into_iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Short description of what a routine hands back, e.g. `rows(integer, text)`.
pub(crate) fn returns_summary(descriptor: &CallDescriptor) -> String {
    if let Some(positions) = descriptor.output_positions() {
        if positions.is_empty() {
            return "nothing".to_string();
        }
        let kinds = positions
            .iter()
            .filter_map(|p| descriptor.param_kinds().get(p - 1).copied());
        return format!("out({})", kind_list(kinds));
    }

    let columns = descriptor
        .return_column_kinds()
        .map(|kinds| kind_list(kinds.iter().copied()))
        .unwrap_or_default();
    match descriptor.return_shape() {
        ReturnShape::Scalar => format!("scalar({columns})"),
        ReturnShape::Tabular => format!("rows({columns})"),
    }
}

impl Execute for ListCmd {
    type Output = ListResult;

    fn execute(self, ctx: &Context) -> Result<Self::Output, Box<dyn Error>> {
        let needle = self.pattern.as_deref().map(str::to_lowercase);

        let routines = ctx
            .catalog()
            .entries()
            .iter()
            .filter(|entry| {
                needle
                    .as_deref()
                    .is_none_or(|n| entry.name.to_lowercase().contains(n))
            })
            .filter(|entry| {
                self.kind
                    .is_none_or(|kind| RoutineKind::of(&entry.descriptor) == kind)
            })
            .map(|entry| RoutineSummary {
                name: entry.name.to_string(),
                kind: RoutineKind::of(&entry.descriptor),
                params: entry.descriptor.param_count(),
                returns: returns_summary(&entry.descriptor),
            })
            .collect();

        Ok(ListResult {
            pattern: self.pattern,
            routines,
        })
    }
}
