//! CSV directory ↔ engine table synchronization.
//!
//! The data directory is the source of truth. Before a command runs,
//! `load_tables` materializes CSVs as tables; afterwards
//! `export_all_tables` writes every table back and deletes CSVs whose table
//! is gone. Dropping a table is how a file gets deleted; creating one is how
//! a file appears.

use crate::database::sanitize_file_name;
use crate::export::CsvExporter;
use crate::ingest::load_csv;
use crate::otel::{db_span, record_db_metrics, DbOperation};
use crate::storage::engine::{list_tables, quote_ident};
use crate::types::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Extension (case-sensitive) that marks a file as a table.
pub const CSV_EXTENSION: &str = ".csv";

/// How CSVs are loaded when a table of the same name already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Keep existing tables; only load CSVs without a table.
    Missing,
    /// Drop and reload every table from its CSV.
    Replace,
}

/// A CSV file and the table it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableFile {
    pub file: String,
    pub table: String,
}

/// Outcome of `load_tables`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub skipped: Vec<String>,
}

/// Outcome of `export_all_tables`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub exported: Vec<String>,
    pub removed: Vec<String>,
    /// Tables whose name cannot be a file in the data directory.
    pub skipped: Vec<String>,
}

/// Table name for a CSV file name, or `None` for other files.
pub fn table_name(file: &str) -> Option<&str> {
    file.strip_suffix(CSV_EXTENSION).filter(|t| !t.is_empty())
}

/// CSV file name for a table, or `None` when the name is not a single
/// plain path component.
pub fn csv_file_name(table: &str) -> Option<String> {
    let file = format!("{}{}", table, CSV_EXTENSION);
    match sanitize_file_name(&file) {
        Ok(reduced) if reduced == file => Some(file),
        _ => None,
    }
}

/// List CSV files in the data directory, sorted by file name.
pub fn csv_files(data_dir: &Path) -> Result<Vec<TableFile>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(file) = entry.file_name().into_string() else {
            continue;
        };
        if let Some(table) = table_name(&file) {
            files.push(TableFile {
                table: table.to_string(),
                file,
            });
        }
    }
    files.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(files)
}

/// Load CSVs from `data_dir` as tables.
///
/// # Arguments
///
/// * `conn` - Engine connection
/// * `data_dir` - Directory holding the CSV files
/// * `mode` - Whether existing tables are kept or reloaded
///
/// # Errors
///
/// Stops at the first CSV that cannot be loaded. Tables loaded before it stay.
pub fn load_tables(conn: &Connection, data_dir: &Path, mode: LoadMode) -> Result<LoadReport> {
    let existing: HashSet<String> = list_tables(conn)?.into_iter().collect();
    let namespace = data_dir.to_string_lossy();
    let mut report = LoadReport::default();

    for TableFile { file, table } in csv_files(data_dir)? {
        let exists = existing.contains(&table);
        if exists && mode == LoadMode::Missing {
            report.skipped.push(table);
            continue;
        }

        let span = db_span(DbOperation::Load, Some(table.as_str()), Some(&*namespace));
        let _guard = span.enter();

        if exists {
            conn.execute_batch(&format!("DROP TABLE {}", quote_ident(&table)))?;
        }
        let rows = load_csv(conn, &table, &data_dir.join(&file))?;
        record_db_metrics(None, Some(rows));
        tracing::debug!(table = %table, rows, "Loaded CSV");
        report.loaded.push(table);
    }

    Ok(report)
}

/// Write every table to `<table>.csv` and delete CSVs without a table.
///
/// Tables named like `../x` or `a/b` are never written; they are logged and
/// listed in `SyncReport::skipped`.
///
/// # Errors
///
/// Returns `DatabaseError::Export` or `DatabaseError::Io` on the first failure;
/// orphan cleanup only runs once every table was exported.
pub fn export_all_tables(conn: &Connection, data_dir: &Path) -> Result<SyncReport> {
    let tables = list_tables(conn)?;
    let namespace = data_dir.to_string_lossy();
    let mut report = SyncReport::default();

    for table in &tables {
        let Some(file) = csv_file_name(table) else {
            tracing::warn!(table = %table, "Table name is not a valid file name, not exported");
            report.skipped.push(table.clone());
            continue;
        };

        let span = db_span(DbOperation::Export, Some(table.as_str()), Some(&*namespace));
        let _guard = span.enter();

        let path = data_dir.join(file);
        let rows = CsvExporter::export(conn, table, &path)?;
        record_db_metrics(Some(rows), None);
        report.exported.push(table.clone());
    }

    let live: HashSet<&str> = tables.iter().map(String::as_str).collect();
    for TableFile { file, table } in csv_files(data_dir)? {
        if live.contains(table.as_str()) {
            continue;
        }
        fs::remove_file(data_dir.join(&file))?;
        tracing::info!(file = %file, "Removed CSV for dropped table");
        report.removed.push(file);
    }

    Ok(report)
}
