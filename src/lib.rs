//! SQL Batch Library
//!
//! Splits SQL scripts into statements and runs them in a single transaction
//! against Oracle, SQL Server or PostgreSQL.

pub mod cli;
pub mod core;
pub mod error;
pub mod generators;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::core::splitter::{split, split_reader};
pub use error::{Error, Result};
