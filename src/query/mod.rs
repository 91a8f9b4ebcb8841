//! SQL front-end: input decoding, splitting, dispatch, rendering.

pub mod command;
pub mod diagnostics;
pub mod executor;
pub mod parser;
pub mod render;

pub use command::Command;
pub use diagnostics::format_error;
pub use executor::{
    execute_command, ExecuteOptions, Execution, Outcome, EMPTY_BATCH_MESSAGE, EXECUTED_MESSAGE,
};
pub use parser::{split_statements, strip_comments, SplitMode, StatementBatch};
pub use render::ResultTable;
