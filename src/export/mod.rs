//! Export tables to spreadsheet-friendly formats.

pub mod csv;

pub use self::csv::CsvExporter;
