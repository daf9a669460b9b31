//! Oracle session backed by the `oracle` crate.
//!
//! The driver is blocking, so each call runs under
//! [`tokio::task::block_in_place`]. This requires the multi-threaded
//! runtime. Oracle opens transactions implicitly and the driver does not
//! autocommit, so `begin` has nothing to send.

use crate::core::executor::Session;
use crate::models::config::ConnectionSettings;
use crate::models::outcome::QueryTable;
use crate::{Error, Result};
use ::oracle::Connection;
use tokio::task::block_in_place;

/// A single Oracle connection.
pub struct OracleSession {
    conn: Connection,
}

impl OracleSession {
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let connect_string = settings.oracle_connect_string();
        let conn = block_in_place(|| {
            Connection::connect(&settings.username, &settings.password, &connect_string)
        })
        .map_err(|e| Error::Connect(e.to_string()))?;
        block_in_place(|| conn.ping()).map_err(|e| Error::Connect(e.to_string()))?;
        Ok(Self { conn })
    }

    fn fetch(&self, sql: &str) -> ::oracle::Result<QueryTable> {
        let rows = self.conn.query(sql, &[])?;
        let columns: Vec<String> = rows
            .column_info()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut data = Vec::new();
        for row in rows {
            let row = row?;
            let mut cells = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                cells.push(row.get::<usize, Option<String>>(i)?);
            }
            data.push(cells);
        }
        Ok(QueryTable::new(columns, data))
    }
}

impl Session for OracleSession {
    async fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> Result<QueryTable> {
        block_in_place(|| self.fetch(sql)).map_err(Error::database)
    }

    async fn execute(&mut self, sql: &str) -> Result<Option<u64>> {
        block_in_place(|| {
            let stmt = self.conn.execute(sql, &[])?;
            stmt.row_count()
        })
        .map(Some)
        .map_err(Error::database)
    }

    async fn commit(&mut self) -> Result<()> {
        block_in_place(|| self.conn.commit()).map_err(Error::database)
    }

    async fn rollback(&mut self) -> Result<()> {
        block_in_place(|| self.conn.rollback()).map_err(Error::database)
    }
}
