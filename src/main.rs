//! SQL Batch CLI
//!
//! A command-line tool for running SQL scripts inside a single transaction.

use clap::Parser;
use sql_batch::cli::{
    args::{Cli, Commands},
    commands::{run, split},
};
use sql_batch::models::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config = config::load_config(cli.config.as_deref());

    // Run the appropriate command
    match cli.command {
        Commands::Run {
            connection,
            sql,
            timeout,
            dry_run,
        } => {
            run::run_script(&config, connection, sql.as_deref(), timeout, dry_run).await?;
        }

        Commands::Split { path, format } => {
            split::split_script(&path, &format)?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
///
/// Logs go to stderr so stdout carries only statement results.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("sql_batch=debug")
    } else {
        EnvFilter::new("sql_batch=info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
