//! Load a CSV file into a SQLite table.
//!
//! The first record is the header. Column types are inferred from the
//! non-empty cells: all integers → `INTEGER`, all numbers → `REAL`,
//! anything else → `TEXT`. Empty cells load as `NULL`.

use crate::storage::engine::quote_ident;
use crate::types::{DatabaseError, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;
use std::path::Path;

/// Inferred SQL column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    /// Convert a raw cell to an engine value of this type.
    fn to_value(self, cell: Option<&str>) -> Value {
        let Some(cell) = cell else {
            return Value::Null;
        };
        match self {
            ColumnType::Integer => cell
                .parse::<i64>()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(cell.to_string())),
            ColumnType::Real => cell
                .parse::<f64>()
                .map(Value::Real)
                .unwrap_or_else(|_| Value::Text(cell.to_string())),
            ColumnType::Text => Value::Text(cell.to_string()),
        }
    }
}

/// Parsed CSV contents with inferred column types.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub columns: Vec<String>,
    pub types: Vec<ColumnType>,
    /// Cells per row; `None` for empty cells.
    pub rows: Vec<Vec<Option<String>>>,
}

/// Read and type a CSV file.
///
/// # Errors
///
/// Returns `DatabaseError::Ingest` if the file has no header or a row is
/// wider than the header, `DatabaseError::Csv` on malformed input
pub fn read_csv(path: &Path) -> Result<CsvTable> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Err(DatabaseError::ingest(format!(
            "{}: no columns to parse",
            path.display()
        )));
    }
    let columns = normalize_header(header.iter());
    let width = columns.len();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > width {
            return Err(DatabaseError::ingest(format!(
                "{}: row {} has {} fields, header has {}",
                path.display(),
                index + 2,
                record.len(),
                width
            )));
        }
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
            .collect();
        row.resize(width, None);
        rows.push(row);
    }

    let types = (0..width)
        .map(|col| infer_column_type(rows.iter().filter_map(|row| row[col].as_deref())))
        .collect();

    Ok(CsvTable {
        columns,
        types,
        rows,
    })
}

/// Infer a column type from its non-empty cells.
pub fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut seen = false;
    let mut all_integer = true;
    for cell in cells {
        seen = true;
        if all_integer && cell.parse::<i64>().is_ok() {
            continue;
        }
        all_integer = false;
        // `f64::from_str` also accepts "nan"/"inf"; require a digit so words stay text
        if !(cell.bytes().any(|b| b.is_ascii_digit()) && cell.parse::<f64>().is_ok()) {
            return ColumnType::Text;
        }
    }
    match (seen, all_integer) {
        (false, _) => ColumnType::Text,
        (true, true) => ColumnType::Integer,
        (true, false) => ColumnType::Real,
    }
}

/// Create `table` from the CSV at `path` and insert all rows.
///
/// Runs in one transaction. The table must not exist yet.
///
/// # Returns
///
/// Number of rows inserted
pub fn load_csv(conn: &Connection, table: &str, path: &Path) -> Result<usize> {
    let csv = read_csv(path)?;

    let column_defs = csv
        .columns
        .iter()
        .zip(&csv.types)
        .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; csv.columns.len()].join(", ");

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&format!(
        "CREATE TABLE {} ({});",
        quote_ident(table),
        column_defs
    ))?;
    {
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            quote_ident(table),
            placeholders
        ))?;
        for row in &csv.rows {
            let values = row
                .iter()
                .zip(&csv.types)
                .map(|(cell, ty)| ty.to_value(cell.as_deref()));
            insert.execute(params_from_iter(values))?;
        }
    }
    tx.commit()?;

    Ok(csv.rows.len())
}

/// Name blank header cells and de-duplicate repeated names.
fn normalize_header<'a>(cells: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for (index, cell) in cells.enumerate() {
        let base = if cell.trim().is_empty() {
            format!("column_{}", index + 1)
        } else {
            cell.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while !seen.insert(name.to_lowercase()) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        columns.push(name);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_infer_column_type() {
        assert_eq!(infer_column_type(["1", "-2", "30"].into_iter()), ColumnType::Integer);
        assert_eq!(infer_column_type(["1", "2.5"].into_iter()), ColumnType::Real);
        assert_eq!(infer_column_type(["1", "two"].into_iter()), ColumnType::Text);
        assert_eq!(infer_column_type(["nan", "inf"].into_iter()), ColumnType::Text);
        assert_eq!(infer_column_type(std::iter::empty()), ColumnType::Text);
    }

    #[test]
    fn test_normalize_header() {
        let cols = normalize_header(["id", "", "id", "ID"].into_iter());
        assert_eq!(cols, vec!["id", "column_2", "id_1", "ID_2"]);
    }

    #[test]
    fn test_read_csv_pads_short_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("people.csv");
        fs::write(&path, "id,name,score\n1,Ada,9.5\n2,Bob\n").unwrap();

        let csv = read_csv(&path).unwrap();
        assert_eq!(csv.columns, vec!["id", "name", "score"]);
        assert_eq!(
            csv.types,
            vec![ColumnType::Integer, ColumnType::Text, ColumnType::Real]
        );
        assert_eq!(csv.rows[1], vec![Some("2".into()), Some("Bob".into()), None]);
    }

    #[test]
    fn test_read_csv_rejects_wide_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "a,b\n1,2,3\n").unwrap();

        assert!(matches!(read_csv(&path), Err(DatabaseError::Ingest(_))));
    }

    #[test]
    fn test_load_csv_types_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("people.csv");
        fs::write(&path, "id,name,score\n1,Ada,9.5\n2,,7\n").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(load_csv(&conn, "people", &path).unwrap(), 2);

        let total: f64 = conn
            .query_row("SELECT SUM(score) FROM people WHERE id > 0", [], |r| r.get(0))
            .unwrap();
        assert_eq!(total, 16.5);
        let nulls: i64 = conn
            .query_row("SELECT COUNT(*) FROM people WHERE name IS NULL", [], |r| r.get(0))
            .unwrap();
        assert_eq!(nulls, 1);
    }
}
