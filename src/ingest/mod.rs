//! CSV ingestion: schema inference and table loading.

pub mod csv;

pub use self::csv::{infer_column_type, load_csv, read_csv, ColumnType, CsvTable};
