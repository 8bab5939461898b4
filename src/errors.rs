//! Attest error taxonomy.
//!
//! Two kinds of trouble exist besides a failed assertion:
//!
//! - **Recoverable** errors (`SourceError`, `ValueError`) are ordinary
//!   `Result` errors. Source recovery errors only ever degrade a failure
//!   message; they never fail or abort an evaluation.
//! - **Contract violations** are programming errors in the caller (an
//!   unsupported condition, a value graph too deep to compare). They are
//!   raised with [`violation`], which panics with a message that always
//!   starts with `contract violation:`.

use std::fmt;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors raised while locating a call site or binding its arguments.
#[derive(Error, Diagnostic, Debug)]
pub enum SourceError {
    #[error("call site not found: {reason}")]
    #[diagnostic(code(attest::source::not_found))]
    NotFound { reason: String },

    #[error("source is not a call to `{expected}`")]
    #[diagnostic(
        code(attest::source::parse),
        help("the entry point must be invoked directly, optionally through a module path")
    )]
    Parse {
        expected: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("expected a call to `{expected}` here")]
        span: SourceSpan,
    },

    #[error("call to `{entry}` has {actual} arguments, expected {expected}")]
    #[diagnostic(code(attest::source::arity))]
    ArityMismatch {
        entry: String,
        expected: usize,
        actual: usize,
    },
}

impl SourceError {
    pub fn not_found(reason: impl Into<String>) -> Self {
        SourceError::NotFound {
            reason: reason.into(),
        }
    }

    /// Builds a parse error labelling `span` inside the call-site text.
    pub fn parse(expected: &str, text: &str, span: (usize, usize)) -> Self {
        SourceError::Parse {
            expected: expected.to_string(),
            src: NamedSource::new("call site", text.to_string()),
            span: SourceSpan::from(span.0..span.1),
        }
    }
}

/// Errors raised while capturing a value for structural comparison.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("structural limit exceeded: value nests deeper than {0} levels (is the value graph cyclic?)")]
    #[diagnostic(code(attest::structural::depth_limit))]
    DepthLimit(usize),

    #[error("value cannot be inspected: {0}")]
    #[diagnostic(code(attest::structural::custom))]
    Custom(String),

    #[error("invalid path pattern `{pattern}`: {reason}")]
    #[diagnostic(
        code(attest::structural::path),
        help("patterns look like `items[*].id`, `scores[\"alice\"]` or `[0]`")
    )]
    InvalidPath { pattern: String, reason: String },
}

impl serde::ser::Error for ValueError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        ValueError::Custom(msg.to_string())
    }
}

/// A programming error in the code calling attest.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractViolation {
    /// A dynamically supplied condition was none of bool, error or comparison.
    UnsupportedCondition { type_name: String },
    /// A structural comparison could not capture one of its operands.
    Uninspectable(ValueError),
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contract violation: ")?;
        match self {
            ContractViolation::UnsupportedCondition { type_name } => write!(
                f,
                "unsupported condition of type {type_name}; expected a bool, an error or a comparison"
            ),
            ContractViolation::Uninspectable(err) => write!(f, "{err}"),
        }
    }
}

/// Raises a contract violation. Never returns.
#[track_caller]
pub fn violation(kind: ContractViolation) -> ! {
    panic!("{kind}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn test_parse_error_carries_label_and_code() {
        let err = SourceError::parse("check", "other(t, x)", (0, 5));
        assert_eq!(err.to_string(), "source is not a call to `check`");
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("attest::source::parse"));
        let labels: Vec<_> = err.labels().into_iter().flatten().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 0);
        assert_eq!(labels[0].len(), 5);
    }

    #[test]
    fn test_violation_message_prefix() {
        let kind = ContractViolation::Uninspectable(ValueError::DepthLimit(8));
        let msg = kind.to_string();
        assert!(msg.starts_with("contract violation: structural limit exceeded"));
        assert!(msg.contains("8 levels"));
    }

    #[test]
    #[should_panic(expected = "contract violation: unsupported condition of type u8")]
    fn test_violation_panics() {
        violation(ContractViolation::UnsupportedCondition {
            type_name: "u8".to_string(),
        });
    }
}
