//! Batch executor.
//!
//! Runs split statements one at a time inside a single transaction:
//! - query-like statements (`select`, `with`) print their rows as a table
//! - everything else prints an affected-row count, or `OK`
//!
//! The first failure rolls the transaction back. Output already written
//! for earlier statements stays written.

use crate::generators::table::render_table;
use crate::models::outcome::{BatchSummary, QueryTable, StatementOutcome};
use crate::{Error, Result};
use std::io::Write;
use std::time::{Duration, Instant};

/// How a statement is sent to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Returns rows.
    Query,
    /// Run for effect.
    Execution,
}

impl StatementKind {
    pub fn label(self) -> &'static str {
        match self {
            StatementKind::Query => "query",
            StatementKind::Execution => "execution",
        }
    }
}

/// Classify a statement by its leading keyword.
pub fn classify(statement: &str) -> StatementKind {
    let normalized = statement.trim_start().to_lowercase();
    if normalized.starts_with("select") || normalized.starts_with("with") {
        StatementKind::Query
    } else {
        StatementKind::Execution
    }
}

/// A database connection able to run one transaction.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Start the transaction.
    async fn begin(&mut self) -> Result<()>;

    /// Run a query and collect all of its rows.
    async fn query(&mut self, sql: &str) -> Result<QueryTable>;

    /// Run a statement for effect. `None` when no row count is available.
    async fn execute(&mut self, sql: &str) -> Result<Option<u64>>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}

async fn run_statement<S: Session>(
    session: &mut S,
    kind: StatementKind,
    sql: &str,
) -> Result<StatementOutcome> {
    match kind {
        StatementKind::Query => Ok(StatementOutcome::Rows(session.query(sql).await?)),
        StatementKind::Execution => Ok(match session.execute(sql).await? {
            Some(count) => StatementOutcome::Affected(count),
            None => StatementOutcome::Ok,
        }),
    }
}

fn write_outcome<W: Write>(
    out: &mut W,
    index: usize,
    kind: StatementKind,
    outcome: &StatementOutcome,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "-- Statement {} ({})", index, kind.label())?;
    match outcome {
        StatementOutcome::Rows(table) => write!(out, "{}", render_table(table))?,
        StatementOutcome::Affected(count) => writeln!(out, "Rows affected: {}", count)?,
        StatementOutcome::Ok => writeln!(out, "OK")?,
    }
    out.flush()?;
    Ok(())
}

async fn rollback_quietly<S: Session>(session: &mut S) {
    match session.rollback().await {
        Ok(()) => tracing::info!("Transaction rolled back"),
        Err(e) => tracing::warn!("Rollback failed: {}", e),
    }
}

/// Run `statements` in one transaction, writing results to `out`.
pub async fn run_batch<S: Session, W: Write>(
    session: &mut S,
    statements: &[String],
    out: &mut W,
) -> Result<BatchSummary> {
    let started = Instant::now();
    let mut summary = BatchSummary::default();

    session.begin().await?;
    tracing::info!("Executing {} statements", statements.len());

    for (i, sql) in statements.iter().enumerate() {
        let index = i + 1;
        let kind = classify(sql);
        tracing::debug!("Statement {} ({}): {}", index, kind.label(), sql);

        let outcome = match run_statement(session, kind, sql).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Statement {} failed: {}", index, e);
                rollback_quietly(session).await;
                return Err(Error::Statement {
                    index,
                    message: e.to_string(),
                });
            }
        };

        match &outcome {
            StatementOutcome::Rows(_) => summary.queries += 1,
            StatementOutcome::Affected(count) => {
                summary.executions += 1;
                summary.rows_affected += count;
            }
            StatementOutcome::Ok => summary.executions += 1,
        }

        if let Err(e) = write_outcome(out, index, kind, &outcome) {
            rollback_quietly(session).await;
            return Err(e);
        }
    }

    if let Err(e) = session.commit().await {
        return Err(Error::Commit(e.to_string()));
    }

    summary.elapsed = started.elapsed();
    tracing::info!(
        "Committed {} statements in {:.2?}",
        summary.total(),
        summary.elapsed
    );
    Ok(summary)
}

/// [`run_batch`] bounded by `limit`. On expiry the transaction is rolled back.
pub async fn run_batch_with_timeout<S: Session, W: Write>(
    session: &mut S,
    statements: &[String],
    out: &mut W,
    limit: Duration,
) -> Result<BatchSummary> {
    let result = tokio::time::timeout(limit, run_batch(&mut *session, statements, &mut *out)).await;
    match result {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Batch exceeded {:?}", limit);
            rollback_quietly(session).await;
            Err(Error::Timeout(limit.as_secs()))
        }
    }
}
