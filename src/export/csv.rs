//! CSV export for spreadsheets.

use crate::storage::engine::quote_ident;
use crate::types::{CellValue, DatabaseError, Result};
use rusqlite::Connection;
use std::fs;
use std::io::Write;
use std::path::Path;

/// CSV exporter.
pub struct CsvExporter;

impl CsvExporter {
    /// Export a table to a CSV file, overwriting it.
    ///
    /// Writes the header row followed by every row in engine order. The file
    /// is written to a sibling temp file first and renamed into place.
    ///
    /// # Arguments
    ///
    /// * `conn` - Engine connection
    /// * `table` - Table name
    /// * `path` - Output file path
    ///
    /// # Returns
    ///
    /// Number of data rows written
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Export` if the table cannot be read or the file written
    pub fn export<P: AsRef<Path>>(conn: &Connection, table: &str, path: P) -> Result<usize> {
        let path = path.as_ref();
        let mut buffer = Vec::new();
        let rows = Self::write_table(conn, table, &mut buffer)?;

        let tmp = path.with_extension("csv.tmp");
        fs::write(&tmp, &buffer)
            .and_then(|_| fs::rename(&tmp, path))
            .map_err(|e| {
                let _ = fs::remove_file(&tmp);
                DatabaseError::export(format!("{}: {}", path.display(), e))
            })?;
        Ok(rows)
    }

    /// Serialize a table as CSV into any writer.
    pub fn write_table<W: Write>(conn: &Connection, table: &str, out: W) -> Result<usize> {
        let mut stmt = conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(table)))
            .map_err(|e| DatabaseError::export(format!("{}: {}", table, e)))?;
        let width = stmt.column_count();

        let mut writer = ::csv::Writer::from_writer(out);
        writer.write_record(stmt.column_names())?;

        let mut rows = stmt.query([])?;
        let mut count = 0;
        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(width);
            for col in 0..width {
                record.push(CellValue::from(row.get_ref(col)?).to_csv_field());
            }
            writer.write_record(&record)?;
            count += 1;
        }
        writer.flush()?;
        Ok(count)
    }
}
