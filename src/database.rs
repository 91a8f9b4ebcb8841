//! High-level database API over a CSV directory.
//!
//! This is the main entry point for the HTTP handlers and the CLI. Every
//! call opens its own engine connection; nothing is cached between calls.

use crate::config::Config;
use crate::otel::{db_span, DbOperation};
use crate::query::{execute_command, format_error, Command, ExecuteOptions};
use crate::storage::{csv_files, export_all_tables, load_tables, Engine};
use crate::types::{DatabaseError, Result};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub use crate::storage::TableFile;

/// Result of one `/run` cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Decoded command text.
    pub sql: String,
    /// Text table, success message, or `ERROR:` message.
    pub output: String,
}

/// CSV directory exposed as an SQL database.
#[derive(Debug, Clone)]
pub struct Database {
    config: Config,
}

impl Database {
    /// Open the database described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Config` for invalid settings, or
    /// `DatabaseError::Io` if the data directory cannot be created
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let db = Database::open(Config::with_data_dir("./data"))?;
    /// let outcome = db.run("SELECT * FROM people")?;
    /// println!("{}", outcome.output);
    /// ```
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;
        tracing::info!(
            data_dir = %config.data_dir.display(),
            in_memory = config.in_memory,
            "Opened CSV database"
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    fn engine(&self) -> Result<Engine> {
        Engine::open_optional(self.config.database_path().as_deref())
    }

    fn execute_options(&self) -> ExecuteOptions {
        ExecuteOptions {
            split_mode: self.config.split_mode,
            annotate_errors: self.config.annotate_errors,
        }
    }

    /// Run one raw command: load CSVs, execute, export tables.
    ///
    /// SQL failures are reported in `RunOutcome::output`. When a CSV
    /// cannot be loaded the command is not executed and nothing is
    /// exported, so no file is deleted because its table is missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine cannot be opened or the export fails
    pub fn run(&self, raw: &str) -> Result<RunOutcome> {
        let command = Command::decode(raw);
        tracing::debug!(envelope = command.is_envelope(), "Decoded command");
        let sql = command.into_sql();

        let engine = self.engine()?;
        let conn = engine.connection();

        if let Err(e) = load_tables(conn, self.data_dir(), self.config.effective_load_mode()) {
            tracing::warn!(error = %e, "Loading CSVs failed, command skipped");
            let output = format_error(&e.engine_message(), "", false);
            return Ok(RunOutcome { sql, output });
        }

        let execution = execute_command(&engine, &sql, self.execute_options());
        let report = export_all_tables(conn, self.data_dir())?;
        tracing::info!(
            statements = execution.batch.len(),
            failed = execution.is_error(),
            exported = report.exported.len(),
            removed = report.removed.len(),
            "Command finished"
        );

        Ok(RunOutcome {
            sql,
            output: execution.output,
        })
    }

    /// CSV files in the data directory, sorted by file name.
    pub fn tables(&self) -> Result<Vec<TableFile>> {
        csv_files(self.data_dir())
    }

    /// Delete every CSV and the SQLite file.
    pub fn reset(&self) -> Result<()> {
        let namespace = self.data_dir().to_string_lossy();
        let span = db_span(DbOperation::Reset, None, Some(&*namespace));
        let _guard = span.enter();

        for table in csv_files(self.data_dir())? {
            fs::remove_file(self.data_dir().join(&table.file))?;
        }
        if let Some(path) = self.config.database_path() {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!("Reset data directory");
        Ok(())
    }

    /// Store uploaded bytes in the data directory.
    ///
    /// # Returns
    ///
    /// The file name actually written
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidFileName` for names without a usable
    /// final component
    pub fn save_upload(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let file = sanitize_file_name(name)?;
        fs::write(self.data_dir().join(&file), bytes)?;
        tracing::info!(file = %file, bytes = bytes.len(), "Saved upload");
        Ok(file)
    }

    /// Contents of a file in the data directory, `None` when absent.
    pub fn read_file(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let Ok(file) = sanitize_file_name(name) else {
            return Ok(None);
        };
        if file != name {
            return Ok(None);
        }
        let path = self.data_dir().join(&file);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }
}

/// Reduce a client-supplied name to its final path component.
///
/// Both `/` and `\` count as separators.
///
/// # Errors
///
/// Returns `DatabaseError::InvalidFileName` when the result is empty, `.`,
/// `..`, or contains a NUL byte
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if file.is_empty() || file == "." || file == ".." || file.contains('\0') {
        return Err(DatabaseError::InvalidFileName(name.to_string()));
    }
    Ok(file.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("people.csv").unwrap(), "people.csv");
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name("C:\\tmp\\x.csv").unwrap(), "x.csv");
        assert!(sanitize_file_name("").is_err());
        assert!(sanitize_file_name("dir/..").is_err());
        assert!(sanitize_file_name("trailing/").is_err());
    }

    #[test]
    fn test_open_creates_data_dir() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("nested").join("data");
        let db = Database::open(Config::with_data_dir(&data)).unwrap();
        assert!(data.is_dir());
        assert!(db.tables().unwrap().is_empty());
    }

    #[test]
    fn test_upload_and_read_back() {
        let dir = tempdir().unwrap();
        let db = Database::open(Config::with_data_dir(dir.path())).unwrap();

        let saved = db.save_upload("../people.csv", b"name\nAda\n").unwrap();
        assert_eq!(saved, "people.csv");
        assert_eq!(
            db.read_file("people.csv").unwrap(),
            Some(b"name\nAda\n".to_vec())
        );
        assert_eq!(db.read_file("missing.csv").unwrap(), None);
        assert_eq!(db.read_file("..").unwrap(), None);
        assert_eq!(db.tables().unwrap()[0].table, "people");
    }

    #[test]
    fn test_run_without_csvs() {
        let dir = tempdir().unwrap();
        let db = Database::open(Config::with_data_dir(dir.path())).unwrap();

        let outcome = db.run("CREATE TABLE t AS SELECT 1 AS x").unwrap();
        assert_eq!(outcome.output, "(Statement executed successfully)");
        assert_eq!(fs::read_to_string(dir.path().join("t.csv")).unwrap(), "x\n1\n");
    }

    #[test]
    fn test_reset_removes_csvs_and_database() {
        let dir = tempdir().unwrap();
        let db = Database::open(Config::with_data_dir(dir.path())).unwrap();
        db.save_upload("a.csv", b"x\n1\n").unwrap();
        db.save_upload("notes.txt", b"keep").unwrap();
        db.run("SELECT * FROM a").unwrap();
        assert!(dir.path().join("database.sqlite").exists());

        db.reset().unwrap();
        assert!(db.tables().unwrap().is_empty());
        assert!(!dir.path().join("database.sqlite").exists());
        assert!(dir.path().join("notes.txt").exists());

        // Nothing left to delete is fine.
        db.reset().unwrap();
    }

    #[test]
    fn test_in_memory_reloads_each_run() {
        let dir = tempdir().unwrap();
        let config = Config {
            in_memory: true,
            ..Config::with_data_dir(dir.path())
        };
        let db = Database::open(config).unwrap();
        db.save_upload("t.csv", b"x\n1\n").unwrap();

        db.run("INSERT INTO t VALUES (2)").unwrap();
        let outcome = db.run("SELECT SUM(x) AS s FROM t").unwrap();
        assert_eq!(outcome.output, "s\n3");
        assert!(!dir.path().join("database.sqlite").exists());
    }
}
