//! PostgreSQL session backed by sqlx.
//!
//! Statements are passed as plain `&str`, which sqlx sends over the simple
//! query protocol. Every value then arrives in text format and decodes as
//! a string regardless of its column type.

use crate::core::executor::Session;
use crate::models::config::ConnectionSettings;
use crate::models::outcome::QueryTable;
use crate::{Error, Result};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Column, Connection, Executor, Row};
use std::str::FromStr;

/// A single PostgreSQL connection.
pub struct PostgresSession {
    conn: PgConnection,
}

impl PostgresSession {
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let options = PgConnectOptions::from_str(&settings.postgres_url())
            .map_err(|e| Error::Connect(e.to_string()))?;
        let mut conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| Error::Connect(e.to_string()))?;
        conn.ping()
            .await
            .map_err(|e| Error::Connect(e.to_string()))?;
        Ok(Self { conn })
    }

    async fn simple(&mut self, sql: &str) -> Result<()> {
        self.conn.execute(sql).await.map_err(Error::database)?;
        Ok(())
    }
}

impl Session for PostgresSession {
    async fn begin(&mut self) -> Result<()> {
        self.simple("BEGIN").await
    }

    async fn query(&mut self, sql: &str) -> Result<QueryTable> {
        let rows = self.conn.fetch_all(sql).await.map_err(Error::database)?;

        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => {
                // No rows to read labels from; ask the server for them.
                let describe = self.conn.describe(sql).await.map_err(Error::database)?;
                describe
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect()
            }
        };

        let mut data = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut cells = Vec::with_capacity(row.len());
            for i in 0..row.len() {
                let cell: Option<String> = row.try_get_unchecked(i).map_err(Error::database)?;
                cells.push(cell);
            }
            data.push(cells);
        }

        Ok(QueryTable::new(columns, data))
    }

    async fn execute(&mut self, sql: &str) -> Result<Option<u64>> {
        let result = self.conn.execute(sql).await.map_err(Error::database)?;
        Ok(Some(result.rows_affected()))
    }

    async fn commit(&mut self) -> Result<()> {
        self.simple("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<()> {
        self.simple("ROLLBACK").await
    }
}
