//! SQL Server session backed by tiberius.

use crate::core::executor::Session;
use crate::models::config::ConnectionSettings;
use crate::models::outcome::QueryTable;
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// A single SQL Server connection.
pub struct SqlServerSession {
    client: Client<Compat<TcpStream>>,
}

impl SqlServerSession {
    pub async fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let mut config = Config::new();
        config.host(&settings.host);
        config.port(settings.port);
        config.database(&settings.dbname);
        config.authentication(AuthMethod::sql_server(&settings.username, &settings.password));
        config.trust_cert();

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| Error::Connect(e.to_string()))?;
        tcp.set_nodelay(true)?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| Error::Connect(e.to_string()))?;
        Ok(Self { client })
    }

    /// Run a batch whose results are not needed.
    async fn batch(&mut self, sql: &str) -> Result<()> {
        self.client
            .simple_query(sql)
            .await
            .map_err(Error::database)?
            .into_results()
            .await
            .map_err(Error::database)?;
        Ok(())
    }
}

fn temporal<T, F>(data: &ColumnData<'static>, render: F) -> Option<String>
where
    T: for<'a> FromSql<'a>,
    F: Fn(T) -> String,
{
    match T::from_sql(data) {
        Ok(value) => value.map(render),
        Err(_) => Some(format!("{:?}", data)),
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{:02X}", b));
    }
    out
}

/// Render a cell as text. `None` is SQL NULL.
fn cell_text(data: ColumnData<'static>) -> Option<String> {
    match data {
        ColumnData::U8(v) => v.map(|v| v.to_string()),
        ColumnData::I16(v) => v.map(|v| v.to_string()),
        ColumnData::I32(v) => v.map(|v| v.to_string()),
        ColumnData::I64(v) => v.map(|v| v.to_string()),
        ColumnData::F32(v) => v.map(|v| v.to_string()),
        ColumnData::F64(v) => v.map(|v| v.to_string()),
        ColumnData::Bit(v) => v.map(|v| v.to_string()),
        ColumnData::String(v) => v.map(|s| s.into_owned()),
        ColumnData::Guid(v) => v.map(|g| g.to_string()),
        ColumnData::Binary(v) => v.map(|b| hex(&b)),
        ColumnData::Numeric(v) => v.map(|n| n.to_string()),
        ColumnData::Xml(v) => v.map(|x| x.into_owned().into_string()),
        ColumnData::Date(_) => temporal::<NaiveDate, _>(&data, |d| d.to_string()),
        ColumnData::Time(_) => temporal::<NaiveTime, _>(&data, |t| t.to_string()),
        ColumnData::DateTimeOffset(_) => {
            temporal::<DateTime<FixedOffset>, _>(&data, |t| t.to_string())
        }
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal::<NaiveDateTime, _>(&data, |t| t.to_string())
        }
        #[allow(unreachable_patterns)]
        other => Some(format!("{:?}", other)),
    }
}

impl Session for SqlServerSession {
    async fn begin(&mut self) -> Result<()> {
        self.batch("BEGIN TRANSACTION").await
    }

    async fn query(&mut self, sql: &str) -> Result<QueryTable> {
        let mut stream = self.client.simple_query(sql).await.map_err(Error::database)?;
        let columns: Vec<String> = stream
            .columns()
            .await
            .map_err(Error::database)?
            .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let rows = stream.into_first_result().await.map_err(Error::database)?;

        let data = rows
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        Ok(QueryTable::new(columns, data))
    }

    async fn execute(&mut self, sql: &str) -> Result<Option<u64>> {
        let result = self.client.execute(sql, &[]).await.map_err(Error::database)?;
        Ok(Some(result.rows_affected().iter().sum()))
    }

    async fn commit(&mut self) -> Result<()> {
        self.batch("COMMIT TRANSACTION").await
    }

    async fn rollback(&mut self) -> Result<()> {
        self.batch("IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION").await
    }
}
