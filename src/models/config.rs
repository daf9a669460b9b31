//! Configuration model.
//!
//! Settings are layered: command-line flags override the environment,
//! which overrides the config file, which overrides built-in defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the database password.
pub const PASSWORD_ENV: &str = "SQL_BATCH_PASSWORD";

/// Username used when none is configured.
pub const DEFAULT_USERNAME: &str = "db_admin";

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Oracle,
    SqlServer,
    Postgres,
}

impl Engine {
    /// Port used when none is configured.
    pub fn default_port(self) -> u16 {
        match self {
            Engine::Oracle => 1521,
            Engine::SqlServer => 1433,
            Engine::Postgres => 5432,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Oracle => "oracle",
            Engine::SqlServer => "sqlserver",
            Engine::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "oracle" => Ok(Engine::Oracle),
            "sqlserver" => Ok(Engine::SqlServer),
            "postgres" => Ok(Engine::Postgres),
            _ => Err(Error::InvalidConfig(vec![format!("unsupported engine: {s}")])),
        }
    }
}

/// Application configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection defaults.
    pub connection: ConnectionConfig,
    /// Execution settings.
    pub execution: ExecutionConfig,
}

/// Partially specified connection settings.
///
/// Every field is optional so that layers can be overlaid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub engine: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub dbname: Option<String>,
}

/// Execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Upper bound on the whole batch, in seconds.
    pub timeout: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { timeout: 300 }
    }
}

impl ConnectionConfig {
    /// Settings taken from the process environment.
    pub fn from_env() -> Self {
        Self {
            password: std::env::var(PASSWORD_ENV).ok(),
            ..Self::default()
        }
    }

    /// Overlay `top` onto `self`; fields set in `top` win.
    pub fn overlay(self, top: ConnectionConfig) -> ConnectionConfig {
        ConnectionConfig {
            engine: top.engine.or(self.engine),
            host: top.host.or(self.host),
            port: top.port.or(self.port),
            username: top.username.or(self.username),
            password: top.password.or(self.password),
            dbname: top.dbname.or(self.dbname),
        }
    }
}

/// Validated connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub engine: Engine,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dbname: String,
}

/// Everything needed to run one script.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub connection: ConnectionSettings,
    pub script: PathBuf,
    pub timeout: Duration,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl RunSettings {
    /// Validate a merged connection config and script path.
    ///
    /// All problems are collected into a single [`Error::InvalidConfig`].
    pub fn resolve(
        connection: &ConnectionConfig,
        script: Option<&Path>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let mut errors = Vec::new();

        let engine_name = present(&connection.engine);
        let host = present(&connection.host);
        let dbname = present(&connection.dbname);
        let script = script.filter(|p| !p.as_os_str().is_empty());

        if engine_name.is_none() {
            errors.push("engine is required".to_string());
        }
        if host.is_none() {
            errors.push("host is required".to_string());
        }
        if dbname.is_none() {
            errors.push("dbname is required".to_string());
        }
        if script.is_none() {
            errors.push("sql path is required".to_string());
        }

        let engine = match engine_name.map(Engine::from_str) {
            Some(Ok(engine)) => Some(engine),
            Some(Err(Error::InvalidConfig(mut messages))) => {
                errors.append(&mut messages);
                None
            }
            Some(Err(e)) => {
                errors.push(e.to_string());
                None
            }
            None => None,
        };

        match (engine, host, dbname, script) {
            (Some(engine), Some(host), Some(dbname), Some(script)) if errors.is_empty() => {
                let port = match connection.port {
                    Some(port) if port != 0 => port,
                    _ => engine.default_port(),
                };
                Ok(Self {
                    connection: ConnectionSettings {
                        engine,
                        host: host.to_string(),
                        port,
                        username: present(&connection.username)
                            .unwrap_or(DEFAULT_USERNAME)
                            .to_string(),
                        password: connection.password.clone().unwrap_or_default(),
                        dbname: dbname.to_string(),
                    },
                    script: script.to_path_buf(),
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            _ => Err(Error::InvalidConfig(errors)),
        }
    }
}

impl ConnectionSettings {
    /// Driver-style connection string for this engine.
    pub fn dsn(&self) -> String {
        self.dsn_with_password(&self.password)
    }

    /// Connection string with the password masked, for logs and dry runs.
    pub fn redacted_dsn(&self) -> String {
        self.dsn_with_password("***")
    }

    fn dsn_with_password(&self, password: &str) -> String {
        let user = urlencoding::encode(&self.username);
        match self.engine {
            Engine::Oracle => format!(
                "oracle://{}:{}@{}:{}/{}",
                user,
                urlencoding::encode(password),
                self.host,
                self.port,
                self.dbname
            ),
            Engine::SqlServer => format!(
                "sqlserver://{}:{}@{}:{}?database={}",
                user,
                urlencoding::encode(password),
                self.host,
                self.port,
                urlencoding::encode(&self.dbname)
            ),
            Engine::Postgres => format!(
                "host={} port={} user={} password={} dbname={} sslmode=disable",
                self.host, self.port, self.username, password, self.dbname
            ),
        }
    }

    /// URL form accepted by the PostgreSQL driver.
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode=disable",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            urlencoding::encode(&self.dbname)
        )
    }

    /// Oracle easy-connect descriptor (`//host:port/service`).
    pub fn oracle_connect_string(&self) -> String {
        format!("//{}:{}/{}", self.host, self.port, self.dbname)
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sql_batch")
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Load configuration from `path`, or from the default location.
///
/// A missing file yields defaults. An unreadable or malformed file is
/// logged and also yields defaults.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        tracing::debug!("No config file at {}", config_path.display());
        return Config::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", config_path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid config {}: {}", config_path.display(), e);
                Config::default()
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read config {}: {}", config_path.display(), e);
            Config::default()
        }
    }
}
