mod execute;
mod output;

use clap::{Args, ValueEnum};
use serde::Serialize;

/// Which kind of routine to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    /// Stored procedures (results through output parameters)
    Procedure,
    /// Functions and catalog queries (results as rows)
    Function,
}

impl RoutineKind {
    pub fn of(descriptor: &crate::call::CallDescriptor) -> Self {
        if descriptor.is_procedure() {
            RoutineKind::Procedure
        } else {
            RoutineKind::Function
        }
    }
}

/// List the routines in the catalog
#[derive(Args, Debug, Default)]
#[command(after_help = "\
Examples:
  routine_call list                      # Every routine
  routine_call list -k procedure         # Procedures only
  routine_call list -p customer          # Names containing 'customer'")]
pub struct ListCmd {
    /// Case-insensitive substring of the routine name
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Only list routines of this kind
    #[arg(short, long, value_enum)]
    pub kind: Option<RoutineKind>,
}
