mod execute;
mod output;

use clap::Args;

/// Call a routine with JSON argument values
///
/// Values fill the routine's input parameters in order; output parameters
/// are skipped. Missing trailing values are passed as absent.
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  routine_call invoke ValidateCustomer 17 '\"a1b2\"'       # Scalar function
  routine_call invoke ViewReviews 0 10 4                    # Rows
  routine_call invoke AddChemicalQuality 3 0.99 12.50       # Procedure
  routine_call invoke SearchProducts 0 20 null null null    # null is SQL NULL")]
pub struct InvokeCmd {
    /// Routine name, as shown by `list`
    pub routine: String,

    /// Input values, one per input parameter (JSON, or bare text for text-like kinds)
    #[arg(allow_hyphen_values = true)]
    pub values: Vec<String>,
}
