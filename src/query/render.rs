//! Plain-text rendering of query results.

use crate::types::{CellValue, Result};
use rusqlite::{Connection, Statement};

/// Rows returned by a read query, in engine order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultTable {
    /// Run `sql` and collect every row.
    pub fn query(conn: &Connection, sql: &str) -> Result<Self> {
        Self::collect(&mut conn.prepare(sql)?)
    }

    /// Step a prepared statement to completion and collect its rows.
    pub fn collect(stmt: &mut Statement<'_>) -> Result<Self> {
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for col in 0..width {
                values.push(CellValue::from(row.get_ref(col)?));
            }
            rows.push(values);
        }

        Ok(Self { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Space-aligned text table: a header line, then one line per row.
    ///
    /// Every column is right-aligned to its widest cell and columns are
    /// separated by a single space. No index column is added.
    pub fn render(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(CellValue::to_display).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut lines = Vec::with_capacity(cells.len() + 1);
        lines.push(render_line(self.columns.iter().map(String::as_str), &widths));
        for row in &cells {
            lines.push(render_line(row.iter().map(String::as_str), &widths));
        }
        lines.join("\n")
    }
}

fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:>width$}"))
        .collect::<Vec<_>>()
        .join(" ")
}
