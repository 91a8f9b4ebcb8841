//! Database operation instrumentation.
//!
//! Implements OpenTelemetry semantic conventions for the CSV sync cycle and
//! SQL execution.

use tracing::{field, span, Level, Span};

/// Database operation types (maps to `db.operation.name`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbOperation {
    /// Load a CSV file as a table
    Load,
    /// Write a table back to CSV
    Export,
    /// Run a statement script
    Execute,
    /// Run a read query and fetch rows
    Query,
    /// Delete CSVs and the engine file
    Reset,
}

impl DbOperation {
    /// Get operation name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Export => "export",
            Self::Execute => "execute",
            Self::Query => "query",
            Self::Reset => "reset",
        }
    }
}

/// Create database operation span with semantic conventions.
///
/// # Arguments
///
/// * `operation` - Database operation type
/// * `collection` - Table name (optional)
/// * `namespace` - Data directory (optional)
///
/// # Returns
///
/// Tracing span with semantic attributes
pub fn db_span(operation: DbOperation, collection: Option<&str>, namespace: Option<&str>) -> Span {
    let span_name = if let Some(coll) = collection {
        format!("{} {}", operation.as_str(), coll)
    } else {
        operation.as_str().to_string()
    };

    let span = span!(
        Level::INFO,
        "db",
        otel.name = %span_name,
        otel.kind = "client",
        db.system.name = "sqlite",
        db.operation.name = operation.as_str(),
        db.collection.name = field::Empty,
        db.namespace = field::Empty,
        db.response.returned_rows = field::Empty,
        db.response.affected_rows = field::Empty,
    );

    if let Some(coll) = collection {
        span.record("db.collection.name", coll);
    }
    if let Some(ns) = namespace {
        span.record("db.namespace", ns);
    }

    span
}

/// Create span for a user SQL command.
///
/// # Arguments
///
/// * `query_text` - Decoded SQL text
/// * `statements` - Number of statements in the batch
pub fn db_query_span(query_text: &str, statements: usize) -> Span {
    span!(
        Level::INFO,
        "db.query",
        otel.name = "query",
        otel.kind = "client",
        db.system.name = "sqlite",
        db.operation.name = "query",
        db.query.text = query_text,
        db.query.statements = statements,
        db.response.returned_rows = field::Empty,
        db.response.affected_rows = field::Empty,
    )
}

/// Record row counts in the current span.
///
/// # Example
///
/// ```rust,ignore
/// let span = db_span(DbOperation::Export, Some("people"), None);
/// let _guard = span.entered();
///
/// let written = write_rows()?;
/// record_db_metrics(Some(written), None);
/// ```
pub fn record_db_metrics(rows_returned: Option<usize>, rows_affected: Option<usize>) {
    let span = Span::current();
    if let Some(returned) = rows_returned {
        span.record("db.response.returned_rows", returned);
    }
    if let Some(affected) = rows_affected {
        span.record("db.response.affected_rows", affected);
    }
}
