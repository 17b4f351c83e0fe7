use std::sync::Arc;

use clap::Parser;

use routine_call::backend::{Backend, PostgresBackend};
use routine_call::catalog::Catalog;
use routine_call::cli::Args;
use routine_call::commands::Context;
use routine_call::config::ConfigFile;
use routine_call::error_log::{ErrorLog, TracingErrorLog};
use routine_call::logging;

/// Open the configured backend, or explain why there is none.
fn open_backend(config: Result<ConfigFile, String>) -> Result<Arc<dyn Backend>, String> {
    let config = config?;
    let connection_string = config.connection_string().map_err(|e| e.to_string())?;
    let backend = PostgresBackend::new(&connection_string).map_err(|e| e.to_string())?;
    Ok(Arc::new(backend))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = ConfigFile::resolve(args.config.as_deref()).map_err(|e| e.to_string());
    let logging_config = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    logging::init(&logging_config)?;

    let log: Arc<dyn ErrorLog> = Arc::new(TracingErrorLog);
    let catalog = match Catalog::build() {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            log.log_error("Catalog", &e.to_string(), true);
            return Err(e.into());
        }
    };

    let ctx = Context::new(catalog, log, open_backend(config));
    let output = args.command.run(&ctx, args.format)?;
    println!("{}", output);
    Ok(())
}
