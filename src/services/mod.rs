//! Database drivers.

pub mod postgres;

#[cfg(feature = "oracle")]
pub mod oracle;
#[cfg(feature = "sqlserver")]
pub mod sqlserver;

use crate::core::executor::Session;
use crate::models::config::{ConnectionSettings, Engine};
use crate::models::outcome::QueryTable;
use crate::Result;

/// An open connection to one of the supported engines.
pub enum Connection {
    Postgres(postgres::PostgresSession),
    #[cfg(feature = "sqlserver")]
    SqlServer(sqlserver::SqlServerSession),
    #[cfg(feature = "oracle")]
    Oracle(oracle::OracleSession),
}

/// Open a connection for `settings`.
pub async fn connect(settings: &ConnectionSettings) -> Result<Connection> {
    tracing::info!(
        "Connecting to {} at {}:{}",
        settings.engine,
        settings.host,
        settings.port
    );
    tracing::debug!("Connection target: {}", settings.redacted_dsn());

    match settings.engine {
        Engine::Postgres => Ok(Connection::Postgres(
            postgres::PostgresSession::connect(settings).await?,
        )),
        #[cfg(feature = "sqlserver")]
        Engine::SqlServer => Ok(Connection::SqlServer(
            sqlserver::SqlServerSession::connect(settings).await?,
        )),
        #[cfg(not(feature = "sqlserver"))]
        Engine::SqlServer => Err(crate::Error::EngineUnavailable(Engine::SqlServer)),
        #[cfg(feature = "oracle")]
        Engine::Oracle => Ok(Connection::Oracle(
            oracle::OracleSession::connect(settings).await?,
        )),
        #[cfg(not(feature = "oracle"))]
        Engine::Oracle => Err(crate::Error::EngineUnavailable(Engine::Oracle)),
    }
}

macro_rules! dispatch {
    ($conn:expr, $session:ident => $call:expr) => {
        match $conn {
            Connection::Postgres($session) => $call,
            #[cfg(feature = "sqlserver")]
            Connection::SqlServer($session) => $call,
            #[cfg(feature = "oracle")]
            Connection::Oracle($session) => $call,
        }
    };
}

impl Session for Connection {
    async fn begin(&mut self) -> Result<()> {
        dispatch!(self, s => s.begin().await)
    }

    async fn query(&mut self, sql: &str) -> Result<QueryTable> {
        dispatch!(self, s => s.query(sql).await)
    }

    async fn execute(&mut self, sql: &str) -> Result<Option<u64>> {
        dispatch!(self, s => s.execute(sql).await)
    }

    async fn commit(&mut self) -> Result<()> {
        dispatch!(self, s => s.commit().await)
    }

    async fn rollback(&mut self) -> Result<()> {
        dispatch!(self, s => s.rollback().await)
    }
}
