//! Statement batch dispatch.
//!
//! Only the last statement decides the response shape. When it is a read
//! query, everything before it runs as one script and the last statement
//! is fetched and rendered. Otherwise the whole command text runs as one
//! script. Engine errors never escape: they become `ERROR:` output.

use crate::otel::{db_query_span, db_span, record_db_metrics, DbOperation};
use crate::query::diagnostics::format_error;
use crate::query::parser::{SplitMode, StatementBatch};
use crate::query::render::ResultTable;
use crate::storage::Engine;
use crate::types::Result;

/// Output for a successful non-read batch.
pub const EXECUTED_MESSAGE: &str = "(Statement executed successfully)";

/// Engine message used when the command holds no statements.
pub const EMPTY_BATCH_MESSAGE: &str = "No SQL statements to execute";

/// Execution knobs taken from `Config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    pub split_mode: SplitMode,
    pub annotate_errors: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            split_mode: SplitMode::Naive,
            annotate_errors: true,
        }
    }
}

/// What a batch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rows of the trailing read query.
    Rows(ResultTable),
    /// Script ran to completion.
    Executed,
    /// Engine error message.
    Failed(String),
}

/// A finished command: parsed batch, outcome, rendered output.
#[derive(Debug, Clone)]
pub struct Execution {
    pub batch: StatementBatch,
    pub outcome: Outcome,
    pub output: String,
}

impl Execution {
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Run one decoded command against `engine`.
///
/// # Arguments
///
/// * `engine` - Connection with CSV tables already loaded
/// * `sql` - Decoded command text
/// * `options` - Split mode and error annotation
///
/// # Returns
///
/// `Execution` whose `output` is a text table, `EXECUTED_MESSAGE` or an
/// `ERROR:` message. A transaction left open by a failed script is
/// rolled back so the engine and the exported CSVs agree.
pub fn execute_command(engine: &Engine, sql: &str, options: ExecuteOptions) -> Execution {
    let batch = StatementBatch::parse(sql, options.split_mode);
    let span = db_query_span(sql, batch.len());
    let _guard = span.enter();

    let outcome = if batch.is_empty() {
        Outcome::Failed(EMPTY_BATCH_MESSAGE.to_string())
    } else {
        match dispatch(engine, sql, &batch) {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(rollback) = engine.rollback_pending() {
                    tracing::warn!(error = %rollback, "Rollback after failed batch failed");
                }
                Outcome::Failed(e.engine_message())
            }
        }
    };

    let output = match &outcome {
        Outcome::Rows(table) => {
            record_db_metrics(Some(table.row_count()), None);
            table.render()
        }
        Outcome::Executed => EXECUTED_MESSAGE.to_string(),
        Outcome::Failed(message) => {
            tracing::info!(error = %message, "SQL command failed");
            format_error(message, &batch.stripped, options.annotate_errors)
        }
    };

    Execution {
        batch,
        outcome,
        output,
    }
}

fn dispatch(engine: &Engine, sql: &str, batch: &StatementBatch) -> Result<Outcome> {
    let conn = engine.connection();

    match batch.last() {
        Some(last) if batch.is_read_query() => {
            let leading = batch.leading();
            if !leading.is_empty() {
                run_script(engine, &format!("{};", leading.join(";")))?;
            }
            let mut stmt = conn.prepare(last)?;
            // `WITH ... INSERT` and friends return no columns.
            if stmt.column_count() == 0 {
                let span = db_span(DbOperation::Execute, None, None);
                let _guard = span.enter();
                stmt.execute([])?;
                drop(stmt);
                engine.commit_pending()?;
                return Ok(Outcome::Executed);
            }
            let span = db_span(DbOperation::Query, None, None);
            let _guard = span.enter();
            Ok(Outcome::Rows(ResultTable::collect(&mut stmt)?))
        }
        _ => {
            run_script(engine, sql)?;
            Ok(Outcome::Executed)
        }
    }
}

fn run_script(engine: &Engine, script: &str) -> Result<()> {
    let span = db_span(DbOperation::Execute, None, None);
    let _guard = span.enter();
    engine.connection().execute_batch(script)?;
    engine.commit_pending()
}
