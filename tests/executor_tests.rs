//! Integration tests for the transactional executor.
//!
//! Tests cover:
//! - Output format for queries and executions
//! - Commit on success, rollback on the first failure
//! - Commit and rollback failures
//! - Timeout handling

use sql_batch::core::executor::{run_batch, run_batch_with_timeout, Session};
use sql_batch::models::outcome::QueryTable;
use sql_batch::{Error, Result};
use std::time::Duration;

/// In-memory session that records every call.
#[derive(Default)]
struct FakeSession {
    calls: Vec<String>,
    fail_on: Option<String>,
    row_count: Option<u64>,
    delay: Option<Duration>,
    fail_commit: bool,
    fail_rollback: bool,
}

impl FakeSession {
    fn failing_on(sql: &str) -> Self {
        Self {
            fail_on: Some(sql.to_string()),
            row_count: Some(1),
            ..Default::default()
        }
    }

    fn check(&self, sql: &str) -> Result<()> {
        if self.fail_on.as_deref() == Some(sql) {
            return Err(Error::Database(format!("syntax error near {sql:?}")));
        }
        Ok(())
    }
}

impl Session for FakeSession {
    async fn begin(&mut self) -> Result<()> {
        self.calls.push("BEGIN".to_string());
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> Result<QueryTable> {
        self.calls.push(format!("query: {sql}"));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check(sql)?;
        Ok(QueryTable::new(
            vec!["id".to_string(), "name".to_string()],
            vec![
                vec![Some("1".to_string()), Some("x;y".to_string())],
                vec![Some("2".to_string()), None],
            ],
        ))
    }

    async fn execute(&mut self, sql: &str) -> Result<Option<u64>> {
        self.calls.push(format!("execute: {sql}"));
        self.check(sql)?;
        Ok(self.row_count)
    }

    async fn commit(&mut self) -> Result<()> {
        self.calls.push("COMMIT".to_string());
        if self.fail_commit {
            return Err(Error::Database("could not serialize access".to_string()));
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.calls.push("ROLLBACK".to_string());
        if self.fail_rollback {
            return Err(Error::Database("connection lost".to_string()));
        }
        Ok(())
    }
}

fn statements(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_successful_batch_output_and_commit() {
    let mut session = FakeSession {
        row_count: Some(3),
        ..Default::default()
    };
    let mut out = Vec::new();

    let summary = run_batch(
        &mut session,
        &statements(&["select id, name from users", "update users set name = 'z'"]),
        &mut out,
    )
    .await
    .unwrap();

    let expected = "
-- Statement 1 (query)
+----+------+
| id | name |
+----+------+
| 1  | x;y  |
| 2  | NULL |
+----+------+

-- Statement 2 (execution)
Rows affected: 3
";
    assert_eq!(String::from_utf8(out).unwrap(), expected);
    assert_eq!(
        session.calls,
        vec![
            "BEGIN",
            "query: select id, name from users",
            "execute: update users set name = 'z'",
            "COMMIT",
        ]
    );
    assert_eq!(summary.queries, 1);
    assert_eq!(summary.executions, 1);
    assert_eq!(summary.rows_affected, 3);
    assert_eq!(summary.total(), 2);
}

#[tokio::test]
async fn test_missing_row_count_prints_ok() {
    let mut session = FakeSession::default();
    let mut out = Vec::new();

    run_batch(&mut session, &statements(&["create table t (a int)"]), &mut out)
        .await
        .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "\n-- Statement 1 (execution)\nOK\n"
    );
}

#[tokio::test]
async fn test_with_statement_runs_as_query() {
    let mut session = FakeSession::default();
    let mut out = Vec::new();

    run_batch(
        &mut session,
        &statements(&["WITH x AS (select 1) SELECT * FROM x"]),
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(session.calls[1], "query: WITH x AS (select 1) SELECT * FROM x");
}

#[tokio::test]
async fn test_failure_rolls_back_and_stops() {
    let mut session = FakeSession::failing_on("insert into t values ('bad')");
    let mut out = Vec::new();

    let err = run_batch(
        &mut session,
        &statements(&[
            "insert into t values (1)",
            "insert into t values ('bad')",
            "insert into t values (3)",
        ]),
        &mut out,
    )
    .await
    .unwrap_err();

    match &err {
        Error::Statement { index, message } => {
            assert_eq!(*index, 2);
            assert!(message.contains("syntax error"));
        }
        other => panic!("Expected Statement error, got {:?}", other),
    }
    assert!(err.is_execution());
    assert_eq!(
        session.calls,
        vec![
            "BEGIN",
            "execute: insert into t values (1)",
            "execute: insert into t values ('bad')",
            "ROLLBACK",
        ]
    );
    // Output for the first statement is not retracted.
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "\n-- Statement 1 (execution)\nRows affected: 1\n"
    );
}

#[tokio::test]
async fn test_rollback_failure_keeps_statement_error() {
    let mut session = FakeSession {
        fail_rollback: true,
        ..FakeSession::failing_on("drop table missing")
    };
    let mut out = Vec::new();

    let err = run_batch(
        &mut session,
        &statements(&["insert into t values (1)", "drop table missing"]),
        &mut out,
    )
    .await
    .unwrap_err();

    match err {
        Error::Statement { index, message } => {
            assert_eq!(index, 2);
            assert!(message.contains("syntax error"));
            assert!(!message.contains("connection lost"));
        }
        other => panic!("Expected Statement error, got {:?}", other),
    }
    assert_eq!(session.calls.last().map(String::as_str), Some("ROLLBACK"));
    assert!(!session.calls.iter().any(|c| c == "COMMIT"));
}

#[tokio::test]
async fn test_commit_failure_is_commit_error() {
    let mut session = FakeSession {
        fail_commit: true,
        row_count: Some(1),
        ..Default::default()
    };
    let mut out = Vec::new();

    let err = run_batch(
        &mut session,
        &statements(&["update t set a = 1"]),
        &mut out,
    )
    .await
    .unwrap_err();

    match &err {
        Error::Commit(message) => assert!(message.contains("could not serialize access")),
        other => panic!("Expected Commit error, got {:?}", other),
    }
    assert!(err.is_execution());
    assert_eq!(
        session.calls,
        vec!["BEGIN", "execute: update t set a = 1", "COMMIT"]
    );
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "\n-- Statement 1 (execution)\nRows affected: 1\n"
    );
}

#[tokio::test]
async fn test_timeout_rolls_back() {
    let mut session = FakeSession {
        delay: Some(Duration::from_secs(30)),
        ..Default::default()
    };
    let mut out = Vec::new();

    let err = run_batch_with_timeout(
        &mut session,
        &statements(&["select 1"]),
        &mut out,
        Duration::from_millis(20),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Timeout(_)));
    assert_eq!(session.calls, vec!["BEGIN", "query: select 1", "ROLLBACK"]);
    assert!(out.is_empty());
}
