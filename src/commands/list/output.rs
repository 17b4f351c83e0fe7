//! Output formatting for list command results.

use super::RoutineKind;
use super::execute::ListResult;
use crate::output::{Outputable, render_columns};

impl Outputable for ListResult {
    fn to_table(&self) -> String {
        let header = match &self.pattern {
            Some(pattern) => format!("Routines matching '{pattern}' ({}):", self.routines.len()),
            None => format!("Routines ({}):", self.routines.len()),
        };

        if self.routines.is_empty() {
            return format!("{header}\n\nNo routines found.");
        }

        let rows: Vec<Vec<String>> = self
            .routines
            .iter()
            .map(|r| {
                let kind = match r.kind {
                    RoutineKind::Procedure => "procedure",
                    RoutineKind::Function => "function",
                };
                vec![
                    r.name.clone(),
                    kind.to_string(),
                    r.params.to_string(),
                    r.returns.clone(),
                ]
            })
            .collect();

        format!(
            "{header}\n\n{}",
            render_columns(&["NAME", "KIND", "PARAMS", "RETURNS"], &rows)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::execute::RoutineSummary;
    use super::*;
    use rstest::{fixture, rstest};

    const EMPTY_TABLE: &str = "\
Routines matching 'zzz' (0):

No routines found.";

    const TWO_TABLE: &str = "\
Routines (2):

NAME                  KIND       PARAMS  RETURNS
--------------------  ---------  ------  ---------------
MarkShipmentReceived  procedure  1       nothing
ValidateCustomer      function   2       scalar(boolean)";

    #[fixture]
    fn empty_result() -> ListResult {
        ListResult {
            pattern: Some("zzz".to_string()),
            routines: vec![],
        }
    }

    #[fixture]
    fn two_result() -> ListResult {
        ListResult {
            pattern: None,
            routines: vec![
                RoutineSummary {
                    name: "MarkShipmentReceived".to_string(),
                    kind: RoutineKind::Procedure,
                    params: 1,
                    returns: "nothing".to_string(),
                },
                RoutineSummary {
                    name: "ValidateCustomer".to_string(),
                    kind: RoutineKind::Function,
                    params: 2,
                    returns: "scalar(boolean)".to_string(),
                },
            ],
        }
    }

    crate::output_table_test! {
        test_name: test_to_table_empty,
        fixture: empty_result,
        fixture_type: ListResult,
        expected: EMPTY_TABLE,
    }

    crate::output_table_test! {
        test_name: test_to_table_two,
        fixture: two_result,
        fixture_type: ListResult,
        expected: TWO_TABLE,
    }

    crate::output_json_test! {
        test_name: test_format_json,
        fixture: two_result,
        fixture_type: ListResult,
        assertions: {
            "routines": serde_json::json!([
                {"name": "MarkShipmentReceived", "kind": "procedure", "params": 1, "returns": "nothing"},
                {"name": "ValidateCustomer", "kind": "function", "params": 2, "returns": "scalar(boolean)"},
            ]),
        },
    }

    crate::output_toon_test! {
        test_name: test_format_toon,
        fixture: two_result,
        fixture_type: ListResult,
        contains: ["routines[2]", "MarkShipmentReceived", "scalar(boolean)"],
    }
}
