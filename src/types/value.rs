//! Owned engine values.
//!
//! Rows read back from SQLite are copied into `CellValue` so they can outlive
//! the statement and be rendered either as CSV fields or as display text.

use rusqlite::types::ValueRef;

/// A single value read from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    /// CSV rendering: `NULL` becomes an empty field.
    pub fn to_csv_field(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            other => other.render(),
        }
    }

    /// Display rendering for text tables: `NULL` is spelled out.
    pub fn to_display(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            other => other.render(),
        }
    }

    fn render(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Real(f) => format_real(*f),
            CellValue::Text(s) => s.clone(),
            CellValue::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(f) => CellValue::Real(f),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
        }
    }
}

/// Shortest round-tripping form of a real that still reads as a real
/// (`3.0`, not `3`), so a reloaded column keeps its `REAL` affinity.
pub fn format_real(value: f64) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_keeps_fraction_marker() {
        assert_eq!(format_real(3.0), "3.0");
        assert_eq!(format_real(1.5), "1.5");
        assert_eq!(format_real(-0.25), "-0.25");
    }

    #[test]
    fn test_null_renderings() {
        assert_eq!(CellValue::Null.to_csv_field(), "");
        assert_eq!(CellValue::Null.to_display(), "NULL");
    }

    #[test]
    fn test_from_value_ref() {
        assert_eq!(CellValue::from(ValueRef::Integer(7)), CellValue::Integer(7));
        assert_eq!(
            CellValue::from(ValueRef::Text(b"abc")),
            CellValue::Text("abc".to_string())
        );
        assert_eq!(CellValue::from(ValueRef::Blob(b"hi")).to_display(), "hi");
    }
}
