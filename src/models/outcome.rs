//! Statement execution results.

use serde::Serialize;
use std::time::Duration;

/// Rows returned by a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryTable {
    /// Column labels in result order.
    pub columns: Vec<String>,
    /// One entry per row. `None` is SQL NULL.
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }
}

/// Result of running a single statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementOutcome {
    /// A query and its rows.
    Rows(QueryTable),
    /// A statement that reported an affected-row count.
    Affected(u64),
    /// A statement whose driver gave no row count.
    Ok,
}

/// Totals for a committed batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Statements run through the query path.
    pub queries: usize,
    /// Statements run for effect.
    pub executions: usize,
    /// Sum of reported affected-row counts.
    pub rows_affected: u64,
    /// Wall time from `BEGIN` to `COMMIT`.
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.queries + self.executions
    }
}
