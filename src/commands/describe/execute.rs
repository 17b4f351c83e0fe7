use std::error::Error;

use serde::Serialize;

use super::DescribeCmd;
use crate::call::{CallDescriptor, ReturnShape};
use crate::commands::list::RoutineKind;
use crate::commands::{Context, Execute};

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamInfo {
    pub position: usize,
    pub name: String,
    pub kind: String,
    pub nullable: bool,
    pub output: bool,
}

/// Result of the describe command
#[derive(Debug, Serialize)]
pub struct DescribeResult {
    pub name: String,
    pub kind: RoutineKind,
    pub call: String,
    pub params: Vec<ParamInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
}

fn params_of(descriptor: &CallDescriptor) -> Vec<ParamInfo> {
    descriptor
        .param_kinds()
        .iter()
        .zip(descriptor.param_nullable())
        .zip(descriptor.param_names())
        .enumerate()
        .map(|(index, ((kind, &nullable), name))| ParamInfo {
            position: index + 1,
            name: name.clone(),
            kind: kind.to_string(),
            nullable,
            output: descriptor.is_output(index),
        })
        .collect()
}

impl Execute for DescribeCmd {
    type Output = DescribeResult;

    fn execute(self, ctx: &Context) -> Result<Self::Output, Box<dyn Error>> {
        let entry = ctx
            .catalog()
            .get(&self.routine)
            .ok_or_else(|| format!("Unknown routine '{}'", self.routine))?;
        let descriptor = &entry.descriptor;

        let shape = (!descriptor.is_procedure()).then(|| match descriptor.return_shape() {
            ReturnShape::Scalar => "scalar",
            ReturnShape::Tabular => "tabular",
        });
        let columns = descriptor
            .return_column_kinds()
            .map(|kinds| kinds.iter().map(ToString::to_string).collect())
            .unwrap_or_default();

        Ok(DescribeResult {
            name: entry.name.to_string(),
            kind: RoutineKind::of(descriptor),
            call: descriptor.call_template().to_string(),
            params: params_of(descriptor),
            shape,
            columns,
        })
    }
}
