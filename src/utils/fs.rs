//! File system utilities.

use crate::{Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Open a SQL script for streaming.
pub fn open_script(path: &Path) -> Result<BufReader<File>> {
    if !path.exists() {
        return Err(Error::PathNotFound(path.display().to_string()));
    }
    let file = File::open(path).map_err(Error::ScriptRead)?;
    Ok(BufReader::new(file))
}

/// Open and split a SQL script.
pub fn read_statements(path: &Path) -> Result<Vec<String>> {
    let reader = open_script(path)?;
    let statements = crate::core::splitter::split_reader(reader)?;
    tracing::debug!(
        "Split {} into {} statements",
        path.display(),
        statements.len()
    );
    Ok(statements)
}

/// Check if a file has a `.sql` extension (case insensitive).
pub fn is_sql_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("sql"))
        .unwrap_or(false)
}
