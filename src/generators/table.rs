//! Fixed-width bordered table rendering for query results.

use crate::models::outcome::QueryTable;

/// Text printed for SQL NULL.
pub const NULL_TEXT: &str = "NULL";

/// Render `table` as a bordered, left-aligned grid.
///
/// ```text
/// +----+-------+
/// | id | name  |
/// +----+-------+
/// | 1  | alice |
/// +----+-------+
/// ```
pub fn render_table(table: &QueryTable) -> String {
    let rows: Vec<Vec<&str>> = table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_deref().unwrap_or(NULL_TEXT))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let header: Vec<&str> = table.columns.iter().map(String::as_str).collect();
    let separator = separator_line(&widths);

    let mut out = String::new();
    out.push_str(&separator);
    out.push_str(&row_line(&header, &widths));
    out.push_str(&separator);
    for row in &rows {
        out.push_str(&row_line(row, &widths));
    }
    out.push_str(&separator);
    out
}

fn separator_line(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn row_line(cells: &[&str], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        let padding = width.saturating_sub(cell.chars().count());
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(padding + 1));
        line.push('|');
    }
    line.push('\n');
    line
}
