//! Embedded engine access and CSV directory synchronization.

pub mod engine;
pub mod sync;

pub use engine::{list_tables, quote_ident, Engine};
pub use sync::{
    csv_files, export_all_tables, load_tables, table_name, LoadMode, LoadReport, SyncReport,
    TableFile, CSV_EXTENSION,
};
