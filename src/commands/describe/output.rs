//! Output formatting for describe command results.

use super::execute::DescribeResult;
use crate::commands::list::RoutineKind;
use crate::output::{Outputable, render_columns};

impl Outputable for DescribeResult {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        let kind = match (self.kind, self.shape) {
            (RoutineKind::Procedure, _) => "procedure".to_string(),
            (RoutineKind::Function, Some(shape)) => format!("function, {shape}"),
            (RoutineKind::Function, None) => "function".to_string(),
        };
        lines.push(format!("{} ({kind})", self.name));
        lines.push(format!("Call: {}", self.call));
        lines.push(String::new());

        if self.params.is_empty() {
            lines.push("Parameters: none".to_string());
        } else {
            lines.push(format!("Parameters ({}):", self.params.len()));
            let rows: Vec<Vec<String>> = self
                .params
                .iter()
                .map(|p| {
                    let mode = match (p.output, p.nullable) {
                        (true, _) => "out",
                        (false, true) => "in, nullable",
                        (false, false) => "in",
                    };
                    vec![
                        p.position.to_string(),
                        p.name.clone(),
                        p.kind.clone(),
                        mode.to_string(),
                    ]
                })
                .collect();
            lines.push(render_columns(&["#", "NAME", "KIND", "MODE"], &rows));
        }

        if !self.columns.is_empty() {
            lines.push(String::new());
            lines.push(format!("Returns: {}", self.columns.join(", ")));
        }

        lines.join("\n")
    }
}
