//! Server and storage configuration.
//!
//! Values come from (lowest to highest priority) built-in defaults, an optional
//! JSON config file, and CLI flags / `P8_CSVDB_*` environment variables applied
//! by the binary.

use crate::query::SplitMode;
use crate::storage::LoadMode;
use crate::types::{DatabaseError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// File name of the persisted SQLite cache inside the data directory.
pub const DEFAULT_DB_FILE: &str = "database.sqlite";

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the CSV files (source of truth).
    pub data_dir: PathBuf,
    /// SQLite file override. Defaults to `<data_dir>/database.sqlite`.
    pub database: Option<PathBuf>,
    /// Use a fresh in-memory engine per request instead of a SQLite file.
    pub in_memory: bool,
    /// How CSVs are loaded into existing tables.
    pub load_mode: LoadMode,
    /// Statement splitting strategy.
    pub split_mode: SplitMode,
    /// Append a caret excerpt to SQL errors mentioning `near`.
    pub annotate_errors: bool,
    /// HTTP bind host.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,
    /// Maximum request body size for uploads, in megabytes.
    pub upload_limit_mb: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database: None,
            in_memory: false,
            load_mode: LoadMode::Missing,
            split_mode: SplitMode::Naive,
            annotate_errors: true,
            host: "127.0.0.1".to_string(),
            port: 5000,
            upload_limit_mb: 50,
        }
    }
}

impl Config {
    /// Config rooted at a data directory, everything else default.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Config` if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DatabaseError::config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| DatabaseError::config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Expand `~` in configured paths.
    pub fn expand_paths(mut self) -> Self {
        self.data_dir = expand(&self.data_dir);
        self.database = self.database.as_deref().map(expand);
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(DatabaseError::config("port must be non-zero"));
        }
        if self.upload_limit_mb == 0 {
            return Err(DatabaseError::config("upload_limit_mb must be non-zero"));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(DatabaseError::config("data_dir must not be empty"));
        }
        Ok(())
    }

    /// SQLite file path, or `None` for the in-memory engine.
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.in_memory {
            return None;
        }
        Some(
            self.database
                .clone()
                .unwrap_or_else(|| self.data_dir.join(DEFAULT_DB_FILE)),
        )
    }

    /// Load mode actually applied. A fresh in-memory engine has no tables,
    /// so it always reloads every CSV.
    pub fn effective_load_mode(&self) -> LoadMode {
        if self.in_memory {
            LoadMode::Replace
        } else {
            self.load_mode
        }
    }

    pub fn upload_limit_bytes(&self) -> usize {
        self.upload_limit_mb.saturating_mul(1024 * 1024)
    }

    /// Parse the bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| DatabaseError::config(format!("Invalid host or port: {}", e)))
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
