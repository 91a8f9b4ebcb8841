//! Decoding of the raw `/run` input.
//!
//! The form field holds either plain SQL or a JSON envelope
//! `{"command": "<sql>"}` that may itself be quoted and backslash-escaped
//! (what an LLM tool call tends to emit). Decoding is a best-effort
//! heuristic: any step that fails falls back to the raw text verbatim.

use serde_json::Value;

/// Decoded SQL for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// SQL unwrapped from a `{"command": ...}` envelope.
    Envelope(String),
    /// Input passed through verbatim.
    Raw(String),
}

impl Command {
    /// Decode raw form input.
    ///
    /// Steps: strip one pair of surrounding double quotes, unescape
    /// backslash sequences, parse JSON, read the `command` string, unescape
    /// it once more. If any step fails the input is treated as plain SQL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use percolate_csvdb::query::Command;
    ///
    /// let raw = r#""{\"command\": \"SELECT * FROM x\"}""#;
    /// assert_eq!(Command::decode(raw).sql(), "SELECT * FROM x");
    /// assert_eq!(Command::decode("SELECT 1"), Command::Raw("SELECT 1".into()));
    /// ```
    pub fn decode(raw: &str) -> Self {
        match decode_envelope(raw) {
            Some(sql) => Command::Envelope(sql),
            None => Command::Raw(raw.to_string()),
        }
    }

    pub fn sql(&self) -> &str {
        match self {
            Command::Envelope(sql) | Command::Raw(sql) => sql,
        }
    }

    pub fn into_sql(self) -> String {
        match self {
            Command::Envelope(sql) | Command::Raw(sql) => sql,
        }
    }

    pub fn is_envelope(&self) -> bool {
        matches!(self, Command::Envelope(_))
    }
}

fn decode_envelope(raw: &str) -> Option<String> {
    let inner = raw
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(raw);
    let json = unescape(inner)?;
    let value: Value = serde_json::from_str(&json).ok()?;
    let command = value.get("command")?.as_str()?;
    unescape(command)
}

/// Resolve backslash escape sequences.
///
/// Recognized: `\\ \' \" \n \r \t \a \b \f \v`, octal `\o`..`\ooo`,
/// `\xHH`, `\uHHHH`, `\UHHHHHHHH`, and an escaped newline (line
/// continuation, removed). Unknown escapes keep their backslash.
///
/// # Returns
///
/// `None` for a trailing lone backslash, `\N`, or a malformed hex escape
pub fn unescape(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escape = chars.next()?;
        match escape {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '\n' => {}
            '0'..='7' => {
                let mut code = escape.to_digit(8)?;
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code)?);
            }
            'x' => out.push(read_hex(&mut chars, 2)?),
            'u' => out.push(read_hex(&mut chars, 4)?),
            'U' => out.push(read_hex(&mut chars, 8)?),
            'N' => return None,
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Some(out)
}

fn read_hex(chars: &mut impl Iterator<Item = char>, digits: usize) -> Option<char> {
    let mut code: u32 = 0;
    for _ in 0..digits {
        code = code.checked_mul(16)? + chars.next()?.to_digit(16)?;
    }
    char::from_u32(code)
}
