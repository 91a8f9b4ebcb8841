//! Percolate CSVDB - CSV files as an embedded SQL database.
//!
//! A directory of CSV files is the source of truth. Each request:
//! - Loads the CSVs as SQLite tables
//! - Runs an ad-hoc SQL command (plain text or a JSON `{"command": ...}` envelope)
//! - Exports every table back to CSV and deletes files for dropped tables
//!
//! Can be used as:
//! - Standalone Rust library (`Database`)
//! - HTTP server and CLI (`csvdb serve`, `csvdb run`)

pub mod config;
pub mod export;
pub mod ingest;
pub mod otel;
pub mod query;
pub mod server;
pub mod storage;
pub mod types;

// High-level database API
pub mod database;

pub use config::Config;
pub use database::{Database, RunOutcome, TableFile};
pub use types::{DatabaseError, Result};
