mod execute;
mod output;

use clap::Args;

/// Show the parameters and results of one routine
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  routine_call describe CompleteTransaction    # Parameters, outputs, call template
  routine_call describe searchproducts         # Names are case-insensitive
  routine_call describe ViewReviews -f json    # Machine-readable")]
pub struct DescribeCmd {
    /// Routine name, as shown by `list`
    pub routine: String,
}
