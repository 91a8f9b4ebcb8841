//! `ERROR:` output with an optional caret excerpt.
//!
//! SQLite syntax errors read `near "TOKEN": syntax error`. The token is
//! looked up textually in the comment-free command; the first line that
//! contains it is echoed with a caret under its first occurrence. The
//! location is approximate: a token repeated earlier in the text is
//! reported at that earlier spot.

/// Format an engine error for the `output` field.
pub fn format_error(message: &str, stripped_sql: &str, annotate: bool) -> String {
    let mut output = format!("ERROR:\n{message}");
    if annotate {
        if let Some(excerpt) = annotate_near(message, stripped_sql) {
            output.push_str("\n\n");
            output.push_str(&excerpt);
        }
    }
    output
}

/// Token following the word `near` in an engine message, without quotes.
pub fn near_token(message: &str) -> Option<&str> {
    let start = find_word(message, "near")? + "near".len();
    let rest = &message[start..];
    let rest = rest.split(':').next().unwrap_or(rest).trim();
    let token = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(rest);
    (!token.is_empty()).then_some(token)
}

/// Caret excerpt for the token named in `message`, if it occurs in `sql`.
///
/// ```text
/// Line 2:
/// SELEKT * FROM t
/// ^
/// ```
pub fn annotate_near(message: &str, sql: &str) -> Option<String> {
    let token = near_token(message)?;
    sql.lines().enumerate().find_map(|(index, line)| {
        let offset = line.find(token)?;
        // Tabs are echoed so the caret stays aligned in a terminal.
        let pad: String = line[..offset]
            .chars()
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        Some(format!("Line {}:\n{}\n{}^", index + 1, line, pad))
    })
}

fn find_word(haystack: &str, word: &str) -> Option<usize> {
    haystack.match_indices(word).map(|(i, _)| i).find(|&i| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + word.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
