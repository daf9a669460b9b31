//! Command line argument definitions.

use crate::models::config::ConnectionConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// SQL Batch - Run a SQL script in a single transaction
#[derive(Parser, Debug)]
#[command(name = "sql-batch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config file (default: <config dir>/sql_batch/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a SQL script inside one transaction
    Run {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Path to the SQL file
        #[arg(long, value_name = "SQL_FILE")]
        sql: Option<PathBuf>,

        /// Abort and roll back after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Dry run - split the script and show what would be executed
        #[arg(long)]
        dry_run: bool,
    },

    /// Split a SQL script and print its statements
    Split {
        /// Path to the SQL file
        #[arg(value_name = "SQL_FILE")]
        path: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// Connection flags shared by commands that talk to a database.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Database engine: oracle, sqlserver, postgres
    #[arg(long)]
    pub engine: Option<String>,

    /// Database host
    #[arg(long)]
    pub host: Option<String>,

    /// Database port (default depends on engine)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database username (default: db_admin)
    #[arg(long)]
    pub username: Option<String>,

    /// Database password (or set SQL_BATCH_PASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// Database name or service
    #[arg(long)]
    pub dbname: Option<String>,
}

impl From<ConnectionArgs> for ConnectionConfig {
    fn from(args: ConnectionArgs) -> Self {
        ConnectionConfig {
            engine: args.engine,
            host: args.host,
            port: args.port,
            username: args.username,
            password: args.password,
            dbname: args.dbname,
        }
    }
}
