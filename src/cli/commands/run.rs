//! Run command implementation.
//!
//! Validates the connection settings, splits the script, and executes
//! every statement inside one transaction.

use crate::cli::args::ConnectionArgs;
use crate::core::executor;
use crate::models::config::{Config, ConnectionConfig, RunSettings};
use crate::services;
use crate::utils::fs;
use crate::{Error, Result};
use colored::Colorize;
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

/// Execute a SQL script.
pub async fn run_script(
    config: &Config,
    args: ConnectionArgs,
    sql: Option<&Path>,
    timeout: Option<u64>,
    dry_run: bool,
) -> Result<()> {
    // File < environment < flags
    let connection = config
        .connection
        .clone()
        .overlay(ConnectionConfig::from_env())
        .overlay(args.into());

    let settings = RunSettings::resolve(
        &connection,
        sql,
        timeout.unwrap_or(config.execution.timeout),
    )?;

    if !fs::is_sql_file(&settings.script) {
        tracing::warn!(
            "{} does not have a .sql extension",
            settings.script.display()
        );
    }

    let statements = fs::read_statements(&settings.script)?;
    if statements.is_empty() {
        return Err(Error::NoStatements);
    }

    println!("{}", "[RUN] Executing script...".bold().cyan());
    println!("  {} {}", "Script:".bold(), settings.script.display());
    println!("  {} {}", "Target:".bold(), settings.connection.redacted_dsn());
    println!("  {} {}", "Statements:".bold(), statements.len());

    if dry_run {
        print_dry_run(&statements);
        return Ok(());
    }

    // One deadline covers connecting and the batch.
    let deadline = Instant::now() + settings.timeout;
    let mut conn = within(settings.timeout, services::connect(&settings.connection)).await?;
    tracing::info!("Connected to {}", settings.connection.redacted_dsn());

    let remaining = deadline.saturating_duration_since(Instant::now());
    let mut out = std::io::stdout();
    let summary = executor::run_batch_with_timeout(&mut conn, &statements, &mut out, remaining)
        .await
        .map_err(|e| match e {
            Error::Timeout(_) => Error::Timeout(settings.timeout.as_secs()),
            e => e,
        })?;
    out.flush()?;

    println!();
    println!(
        "{} {} statements ({} queries, {} executions, {} rows affected) in {:.2?}",
        "[OK] Committed".bold().green(),
        summary.total(),
        summary.queries,
        summary.executions,
        summary.rows_affected,
        summary.elapsed
    );

    Ok(())
}

async fn within<T>(limit: Duration, work: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Connection not established within {:?}", limit);
            Err(Error::Timeout(limit.as_secs()))
        }
    }
}

fn print_dry_run(statements: &[String]) {
    println!();
    println!("{}", "[DRY RUN] No changes will be made".bold().yellow());
    for (i, statement) in statements.iter().enumerate() {
        println!();
        println!(
            "{} {}",
            format!("-- Statement {}", i + 1).bold(),
            format!("({})", executor::classify(statement).label()).dimmed()
        );
        println!("{}", statement);
    }
}
