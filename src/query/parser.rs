//! Comment stripping and statement splitting.
//!
//! Two splitters are available. `Naive` is line-based comment removal
//! followed by a plain split on `;`: a semicolon inside a string literal
//! ends the statement, and `/*`/`*/` markers only count at the start/end
//! of a trimmed line. `Lexical` is a small tokenizer that understands
//! quoting and comments anywhere in the text.

use serde::{Deserialize, Serialize};

/// Statement splitting strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Line-based comment removal, split on every `;`.
    #[default]
    Naive,
    /// Quote- and comment-aware tokenizer.
    Lexical,
}

/// Remove whole-line comments.
///
/// A trimmed line starting with `--` is dropped. A trimmed line starting
/// with `/*` opens a block that runs through the first line ending with
/// `*/` (the same line, for a one-line block). Everything else is kept
/// verbatim, including a stray `*/` line outside any block.
///
/// A one-line `/* ... */` therefore never swallows the lines after it.
pub fn strip_comments(text: &str) -> String {
    let mut kept = Vec::new();
    let mut in_block = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if in_block {
            if trimmed.ends_with("*/") {
                in_block = false;
            }
            continue;
        }
        if trimmed.starts_with("/*") {
            in_block = !(trimmed.len() >= 4 && trimmed.ends_with("*/"));
            continue;
        }
        if trimmed.starts_with("--") {
            continue;
        }
        kept.push(line);
    }

    kept.join("\n")
}

/// Split comment-free text on `;`, dropping empty fragments.
pub fn split_naive(text: &str) -> Vec<String> {
    text.trim()
        .trim_end_matches(';')
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comment-stripped statements of a raw command.
pub fn split_statements(text: &str, mode: SplitMode) -> Vec<String> {
    StatementBatch::parse(text, mode).statements
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Normal,
    LineComment,
    BlockComment,
    /// Inside a quoted span closed by the given character.
    Quoted(char),
}

/// Tokenize `text`, dropping comments and splitting on top-level `;`.
///
/// Returns the comment-free text and the trimmed, non-empty statements.
/// Quote doubling (`'it''s'`) needs no special case: the closing quote
/// leaves the span and the next one reopens it.
pub fn split_lexical(text: &str) -> (String, Vec<String>) {
    let mut stripped = String::with_capacity(text.len());
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = LexState::Normal;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            LexState::Normal => match c {
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = LexState::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = LexState::BlockComment;
                }
                ';' => {
                    stripped.push(c);
                    push_statement(&mut statements, &mut current);
                }
                '\'' | '"' | '`' => {
                    state = LexState::Quoted(c);
                    stripped.push(c);
                    current.push(c);
                }
                '[' => {
                    state = LexState::Quoted(']');
                    stripped.push(c);
                    current.push(c);
                }
                _ => {
                    stripped.push(c);
                    current.push(c);
                }
            },
            LexState::LineComment => {
                if c == '\n' {
                    state = LexState::Normal;
                    stripped.push(c);
                    current.push(c);
                }
            }
            LexState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = LexState::Normal;
                    stripped.push(' ');
                    current.push(' ');
                }
            }
            LexState::Quoted(close) => {
                if c == close {
                    state = LexState::Normal;
                }
                stripped.push(c);
                current.push(c);
            }
        }
    }
    push_statement(&mut statements, &mut current);

    (stripped, statements)
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

/// Comment-free text of a command split into statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementBatch {
    /// Command text with comments removed, used for error excerpts.
    pub stripped: String,
    pub statements: Vec<String>,
}

impl StatementBatch {
    pub fn parse(sql: &str, mode: SplitMode) -> Self {
        match mode {
            SplitMode::Naive => {
                let stripped = strip_comments(sql);
                let statements = split_naive(&stripped);
                Self { stripped, statements }
            }
            SplitMode::Lexical => {
                let (stripped, statements) = split_lexical(sql);
                Self { stripped, statements }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn last(&self) -> Option<&str> {
        self.statements.last().map(String::as_str)
    }

    /// Statements before the last one.
    pub fn leading(&self) -> &[String] {
        match self.statements.split_last() {
            Some((_, leading)) => leading,
            None => &[],
        }
    }

    /// Whether the last statement produces rows.
    pub fn is_read_query(&self) -> bool {
        self.last().is_some_and(is_read_statement)
    }
}

/// Case-insensitive `SELECT`/`WITH` prefix check.
pub fn is_read_statement(statement: &str) -> bool {
    let head: String = statement
        .chars()
        .take(6)
        .flat_map(char::to_lowercase)
        .collect();
    head.starts_with("select") || head.starts_with("with")
}
