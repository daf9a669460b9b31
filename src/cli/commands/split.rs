//! Split command implementation.

use crate::utils::fs;
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Print the statements of a SQL script without connecting anywhere.
pub fn split_script(path: &Path, format: &str) -> Result<()> {
    let statements = fs::read_statements(path)?;

    match format {
        "json" => print_json(&statements)?,
        _ => print_text(&statements),
    }

    Ok(())
}

/// Print statements as a JSON array.
fn print_json(statements: &[String]) -> Result<()> {
    #[derive(serde::Serialize)]
    struct StatementJson<'a> {
        index: usize,
        kind: &'static str,
        sql: &'a str,
    }

    let output: Vec<StatementJson> = statements
        .iter()
        .enumerate()
        .map(|(i, sql)| StatementJson {
            index: i + 1,
            kind: crate::core::executor::classify(sql).label(),
            sql,
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print statements separated by blank lines.
fn print_text(statements: &[String]) {
    if statements.is_empty() {
        println!("{}", "No statements found.".yellow());
        return;
    }
    for (i, statement) in statements.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", format!("-- Statement {}", i + 1).bold());
        println!("{}", statement);
    }
}
