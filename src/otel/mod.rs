//! Tracing instrumentation for CSVDB.
//!
//! Follows OpenTelemetry semantic conventions for database operations:
//! - https://opentelemetry.io/docs/specs/semconv/database/database-spans/
//!
//! **Span naming**: `{db.operation.name} {target}`
//! - Example: `load people`, `export orders`, `query`
//!
//! **Required attributes**:
//! - `db.system.name`: Always `"sqlite"`
//!
//! **Conditionally required**:
//! - `db.collection.name`: Table name
//! - `db.namespace`: Data directory
//!
//! # Example
//!
//! ```rust,ignore
//! use percolate_csvdb::otel::{db_span, DbOperation};
//!
//! let span = db_span(DbOperation::Load, Some("people"), Some("data"));
//! let _guard = span.entered();
//! ```

pub mod db;
pub mod logging;

pub use db::{db_query_span, db_span, record_db_metrics, DbOperation};
pub use logging::{init_logging, LogFormat};
