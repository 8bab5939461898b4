//! Call-site recovery: where an assertion was invoked and what its
//! arguments looked like in the source.
//!
//! - [`locator`] finds the file, line and column of the caller.
//! - [`cache`] holds source file contents, read once per path.
//! - [`args`] binds the entry point's parameters to argument source text.
//!
//! Everything here is best effort. Failures come back as
//! [`SourceError`](crate::errors::SourceError) and the engine falls back
//! to a message without source text.

pub mod args;
pub mod cache;
pub(crate) mod lex;
pub mod locator;

use std::path::{Path, PathBuf};

use crate::errors::SourceError;
use lex::Scan;

pub use args::{extract, ArgumentBinding, EntryPoint, OperandSource};
pub use locator::{BacktraceLocator, CallerLocator, FixedLocator, SourceLocator};

/// Upper bound on the lines one call expression may span.
const MAX_CALL_LINES: usize = 64;

/// A recovered call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub file: PathBuf,
    /// One-based line of the call.
    pub line: u32,
    /// One-based column of the call.
    pub column: u32,
    /// Source text of the call expression, from `column` to the bracket
    /// closing its argument list.
    pub text: String,
}

impl CallSite {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32, text: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            text: text.into(),
        }
    }

    /// Reads the call expression starting at `line`:`column` of `file`.
    pub fn read(file: &Path, line: u32, column: u32) -> Result<CallSite, SourceError> {
        let source = cache::read(file).ok_or_else(|| {
            SourceError::not_found(format!("source file {} is not readable", file.display()))
        })?;
        let text = call_text(&source, line, column).ok_or_else(|| {
            SourceError::not_found(format!("{}:{line} is past the end of the file", file.display()))
        })?;
        Ok(CallSite::new(file, line, column, text))
    }
}

/// Extracts the text of the call starting at `line`:`column` (both
/// one-based), following it over continuation lines until the brackets it
/// opens are balanced.
pub(crate) fn call_text(source: &str, line: u32, column: u32) -> Option<String> {
    let first = usize::try_from(line).ok()?.checked_sub(1)?;
    let lines: Vec<&str> = source.lines().skip(first).take(MAX_CALL_LINES).collect();
    let head = *lines.first()?;

    let col = usize::try_from(column).unwrap_or(1).saturating_sub(1);
    let head: String = if col < head.chars().count() {
        head.chars().skip(col).collect()
    } else {
        head.to_string()
    };

    let mut text = head;
    for next in lines.iter().skip(1) {
        if !unclosed(&text) {
            break;
        }
        text.push('\n');
        text.push_str(next);
    }
    Some(truncate_after_call(&text))
}

/// Whether `text` opens more brackets than it closes.
fn unclosed(text: &str) -> bool {
    let scan = Scan::new(text);
    let mut depth = 0i64;
    for i in (0..scan.len()).filter(|&i| scan.is_code(i)) {
        match scan.chars[i] {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
    }
    depth > 0
}

/// Cuts the text after the bracket closing the first argument list.
fn truncate_after_call(text: &str) -> String {
    let scan = Scan::new(text);
    let open = (0..scan.len()).find(|&i| scan.is_code(i) && scan.chars[i] == '(');
    match open.and_then(|open| scan.matching_close(open)) {
        Some(close) => scan.slice(0, close + 1),
        None => text.to_string(),
    }
}
