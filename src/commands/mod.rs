//! Command definitions and implementations.
//!
//! Each command is defined in its own module with:
//! - The command struct with clap attributes for CLI parsing
//! - An `Execute` impl producing a serializable result
//! - An `Outputable` impl rendering that result as a table

pub mod describe;
pub mod invoke;
pub mod list;

pub use describe::DescribeCmd;
pub use invoke::InvokeCmd;
pub use list::ListCmd;

use clap::Subcommand;
use std::error::Error;
use std::sync::Arc;

use crate::backend::Backend;
use crate::call::CallExecutor;
use crate::catalog::Catalog;
use crate::error_log::ErrorLog;
use crate::output::{OutputFormat, Outputable};

/// Everything a command may need to run.
///
/// The backend is optional so that catalog-only commands work without a
/// database; the error explains why no backend is available.
pub struct Context {
    catalog: Arc<Catalog>,
    log: Arc<dyn ErrorLog>,
    backend: Result<Arc<dyn Backend>, String>,
}

impl Context {
    pub fn new(
        catalog: Arc<Catalog>,
        log: Arc<dyn ErrorLog>,
        backend: Result<Arc<dyn Backend>, String>,
    ) -> Self {
        Self {
            catalog,
            log,
            backend,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// An executor over the configured backend.
    pub fn executor(&self) -> Result<CallExecutor, Box<dyn Error>> {
        match &self.backend {
            Ok(backend) => Ok(CallExecutor::new(Arc::clone(backend), Arc::clone(&self.log))),
            Err(reason) => Err(format!("No database available: {reason}").into()),
        }
    }
}

/// Trait for executing commands with command-specific result types.
pub trait Execute {
    type Output: Outputable;

    fn execute(self, ctx: &Context) -> Result<Self::Output, Box<dyn Error>>;
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the routines in the catalog
    List(ListCmd),

    /// Show the parameters and results of one routine
    Describe(DescribeCmd),

    /// Call a routine with JSON argument values
    Invoke(InvokeCmd),

    /// Catch-all for unknown commands
    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

impl Command {
    /// Execute the command and return formatted output
    pub fn run(self, ctx: &Context, format: OutputFormat) -> Result<String, Box<dyn Error>> {
        match self {
            Command::List(cmd) => {
                let result = cmd.execute(ctx)?;
                Ok(result.format(format))
            }
            Command::Describe(cmd) => {
                let result = cmd.execute(ctx)?;
                Ok(result.format(format))
            }
            Command::Invoke(cmd) => {
                let result = cmd.execute(ctx)?;
                Ok(result.format(format))
            }
            Command::Unknown(args) => {
                Err(format!("Unknown command: {}", args.first().map(String::as_str).unwrap_or("")).into())
            }
        }
    }
}
