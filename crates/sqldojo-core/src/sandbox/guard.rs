//! Pre-execution vetting of submission text.
//!
//! The transaction-and-rollback sandbox assumes the submission cannot end
//! the transaction or widen the attached namespace set. SQLite would happily
//! accept COMMIT or ATTACH from query text, so those statement forms are
//! rejected up front, as are the `pragma_*` table-valued functions that
//! expose engine state (attached database paths included) from inside a
//! SELECT. The scanner is string- and comment-aware; beyond these checks,
//! the text is the engine's business.

use crate::errors::ExecutionError;

const DENIED: &[&str] = &[
    "attach",
    "detach",
    "pragma",
    "begin",
    "commit",
    "end",
    "rollback",
    "savepoint",
    "release",
    "vacuum",
];

pub fn check(sql: &str) -> Result<(), ExecutionError> {
    if sql.trim().is_empty() {
        return Err(ExecutionError::runtime("submission is empty"));
    }

    let bytes = sql.as_bytes();
    let mut i = 0;
    let mut statement_start = true;
    while i < bytes.len() {
        match bytes[i] {
            b';' => {
                statement_start = true;
                i += 1;
            }
            c if c.is_ascii_whitespace() => i += 1,
            b'\'' | b'"' | b'`' => {
                i = skip_quoted(bytes, i);
                statement_start = false;
            }
            b'[' => {
                while i < bytes.len() && bytes[i] != b']' {
                    i += 1;
                }
                i += 1;
                statement_start = false;
            }
            b'-' if i + 1 < bytes.len() && bytes[i + 1] == b'-' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let word = sql[start..i].to_ascii_lowercase();
                if statement_start && DENIED.contains(&word.as_str()) {
                    return Err(ExecutionError::runtime(format!(
                        "{} statements are not allowed in submissions",
                        word.to_ascii_uppercase()
                    )));
                }
                if word.starts_with("pragma_") {
                    return Err(ExecutionError::runtime(
                        "PRAGMA functions are not allowed in submissions",
                    ));
                }
                statement_start = false;
            }
            _ => {
                i += 1;
                statement_start = false;
            }
        }
    }
    Ok(())
}

fn skip_quoted(bytes: &[u8], mut i: usize) -> usize {
    let quote = bytes[i];
    i += 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            // doubled quote is an escape
            if i + 1 < bytes.len() && bytes[i + 1] == quote {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    i
}
