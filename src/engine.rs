//! The evaluation engine.
//!
//! Evaluates one [`Condition`] for one entry point. On success nothing
//! happens. On failure the engine recovers the source text of the call
//! (best effort), synthesizes a single message, logs it once through the
//! host and signals the failure the way the entry point asks for.

use std::fmt::Display;
use std::panic::Location;

use crate::comparison::{Operand, Outcome};
use crate::condition::Condition;
use crate::diff::{diff_operands, Side};
use crate::errors::{self, ContractViolation};
use crate::host::TestingT;
use crate::message::{with_custom_message, FAILURE_PREFIX};
use crate::settings::Settings;
use crate::source::args::is_printable_expr;
use crate::source::lex::{is_ident_char, Scan};
use crate::source::locator::locator_for;
use crate::source::{extract, ArgumentBinding, EntryPoint, SourceLocator};

// ============================================================================
// EVALUATOR
// ============================================================================

/// How a failed evaluation is signalled to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// `fail_now`: stop the test.
    FailNow,
    /// `fail`: mark the test failed and continue.
    Fail,
}

/// The result of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub ok: bool,
    /// The logged failure message.
    pub message: Option<String>,
}

impl Evaluation {
    fn success() -> Self {
        Self {
            ok: true,
            message: None,
        }
    }
}

/// Evaluates conditions on behalf of one entry point.
pub struct Evaluator {
    settings: Settings,
    locator: Box<dyn SourceLocator>,
    entry: &'static EntryPoint,
    on_failure: OnFailure,
    skip_frames: usize,
}

impl Evaluator {
    pub fn new(
        settings: Settings,
        locator: Box<dyn SourceLocator>,
        entry: &'static EntryPoint,
        on_failure: OnFailure,
    ) -> Self {
        Self {
            settings,
            locator,
            entry,
            on_failure,
            skip_frames: 0,
        }
    }

    /// An evaluator using the global settings and the configured locator,
    /// anchored at `location` (the entry point's caller).
    pub fn for_caller(
        entry: &'static EntryPoint,
        on_failure: OnFailure,
        location: &'static Location<'static>,
    ) -> Self {
        let settings = Settings::global().clone();
        let locator = locator_for(settings.locator, location);
        Self::new(settings, locator, entry, on_failure)
    }

    /// Frames between the entry point's caller and the call whose source
    /// should be shown, for helpers wrapping an entry point.
    pub fn skip_frames(mut self, skip_frames: usize) -> Self {
        self.skip_frames = skip_frames;
        self
    }

    /// Evaluates `condition`. A failure is logged once and signalled.
    ///
    /// # Panics
    ///
    /// Panics with a `contract violation:` message for
    /// [`Condition::Unsupported`].
    pub fn evaluate(
        &self,
        t: &mut dyn TestingT,
        condition: Condition<'_>,
        msg_and_args: &[&dyn Display],
    ) -> Evaluation {
        let failure = match condition {
            Condition::Bool(true) | Condition::Error(None) => return Evaluation::success(),
            Condition::Bool(false) => Failure::False,
            Condition::Error(Some(err)) => {
                Failure::Message(format!("error is not nil: {}", err.message))
            }
            Condition::Comparison(cmp) => match cmp.run() {
                Outcome::Success => return Evaluation::success(),
                Outcome::Failure(message) => Failure::Message(message),
                Outcome::FailureUnknown(operands) => Failure::Operands(operands),
            },
            Condition::Unsupported { type_name } => {
                errors::violation(ContractViolation::UnsupportedCondition { type_name })
            }
        };

        let source = match failure {
            Failure::Message(message) => message,
            Failure::False => {
                let binding = self.binding();
                let expr = binding
                    .as_ref()
                    .zip(self.entry.condition)
                    .and_then(|(binding, param)| binding.get(param));
                bool_message(expr)
            }
            Failure::Operands(operands) => {
                let labels = self
                    .binding()
                    .map(|binding| binding.operand_labels(self.entry))
                    .unwrap_or_default();
                operands_message(&operands, &labels, self.settings.diff_context)
            }
        };

        let message = format!(
            "{FAILURE_PREFIX}{}",
            with_custom_message(&source, msg_and_args)
        );
        t.log(&message);
        match self.on_failure {
            OnFailure::FailNow => t.fail_now(),
            OnFailure::Fail => t.fail(),
        }
        Evaluation {
            ok: false,
            message: Some(message),
        }
    }

    /// Recovers the argument source text of the call. Any failure here only
    /// makes the message less specific.
    fn binding(&self) -> Option<ArgumentBinding> {
        if !self.settings.source_lookup {
            return None;
        }
        let site = match self.locator.locate(self.skip_frames) {
            Ok(site) => site,
            Err(err) => {
                tracing::debug!(entry = self.entry.name, error = %err, "call site not recovered");
                return None;
            }
        };
        match extract(&site.text, self.entry) {
            Ok(binding) => Some(binding),
            Err(err) => {
                tracing::debug!(
                    entry = self.entry.name,
                    file = %site.file.display(),
                    line = site.line,
                    error = %err,
                    "arguments not recovered"
                );
                None
            }
        }
    }
}

enum Failure {
    False,
    Message(String),
    Operands(Vec<Operand>),
}

// ============================================================================
// MESSAGE SYNTHESIS
// ============================================================================

/// Phrases a false boolean condition from its source expression.
pub fn bool_message(expr: Option<&str>) -> String {
    let Some(expr) = expr.map(str::trim).filter(|e| !e.is_empty()) else {
        return "condition is false".to_string();
    };
    let scan = Scan::new(expr);

    let logical = (0..scan.len().saturating_sub(1)).any(|i| {
        scan.is_top_level(i)
            && scan.is_top_level(i + 1)
            && matches!((scan.chars[i], scan.chars[i + 1]), ('&', '&') | ('|', '|'))
    });
    if !logical {
        if let Some((lhs, op, rhs)) = split_comparison(&scan) {
            let phrase = match op {
                "!=" => "is",
                "==" => "is not",
                ">" => "is <=",
                "<" => "is >=",
                ">=" => "is less than",
                _ => "is greater than",
            };
            return format!("{lhs} {phrase} {rhs}");
        }
        if let Some(inner) = expr.strip_prefix('!').map(str::trim) {
            if is_path(inner) {
                return format!("{inner} is true");
            }
        }
        if is_path(expr) {
            return format!("{expr} is false");
        }
    }
    format!("expression is false: {expr}")
}

/// Finds the first top-level comparison operator. `<` and `>` only count
/// when surrounded by spaces, which keeps generics out.
fn split_comparison(scan: &Scan) -> Option<(String, &'static str, String)> {
    let chars = &scan.chars;
    let at = |i: usize| chars.get(i).copied();
    for i in 0..scan.len() {
        if !scan.is_top_level(i) {
            continue;
        }
        let op = match (chars[i], at(i + 1)) {
            ('=', Some('=')) if at(i + 2) != Some('=') => "==",
            ('!', Some('=')) => "!=",
            ('>', Some('=')) if i > 0 && at(i - 1) != Some('>') => ">=",
            ('<', Some('=')) if i > 0 && at(i - 1) != Some('<') => "<=",
            ('>', Some(' ')) if i > 0 && at(i - 1) == Some(' ') => ">",
            ('<', Some(' ')) if i > 0 && at(i - 1) == Some(' ') => "<",
            _ => continue,
        };
        let lhs = scan.slice(0, i).trim().to_string();
        let rhs = scan.slice(i + op.len(), scan.len()).trim().to_string();
        if lhs.is_empty() || rhs.is_empty() {
            return None;
        }
        return Some((lhs, op, rhs));
    }
    None
}

fn is_path(expr: &str) -> bool {
    expr.starts_with(|c: char| c.is_alphabetic() || c == '_')
        && expr.chars().all(|c| is_ident_char(c) || c == '.' || c == ':')
        && !matches!(expr, "true" | "false")
}

/// `&x` and `&mut x` are labelled `x`.
fn strip_reference(expr: &str) -> &str {
    expr.strip_prefix("&mut ")
        .or_else(|| expr.strip_prefix('&'))
        .map(str::trim_start)
        .unwrap_or(expr)
}

/// Renders the operands of a comparison that failed without a message.
/// Two operands are `[actual, expected]` and are diffed.
pub fn operands_message(operands: &[Operand], labels: &[Option<String>], context: usize) -> String {
    let label = |i: usize| {
        labels
            .get(i)
            .and_then(Option::as_deref)
            .map(strip_reference)
            .filter(|l| is_printable_expr(l))
    };
    match operands {
        [] => "comparison failed".to_string(),
        [actual, expected] => {
            let report = diff_operands(expected, actual, context);
            let rendered = report.render(
                Side::new(label(1), Some(expected.type_name())),
                Side::new(label(0), Some(actual.type_name())),
            );
            if report.is_multiline() {
                format!("values are not equal:\n{}", rendered.trim_end())
            } else {
                rendered
            }
        }
        _ => {
            let got: Vec<String> = operands
                .iter()
                .enumerate()
                .map(|(i, op)| match label(i) {
                    Some(l) => format!("{} ({l} {})", op.rendered(), op.type_name()),
                    None => format!("{} ({})", op.rendered(), op.type_name()),
                })
                .collect();
            format!("comparison failed: got {}", got.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert::{CHECK, EQUAL};
    use crate::comparison::Comparison;
    use crate::host::Recorder;
    use crate::source::{BacktraceLocator, CallSite, FixedLocator};

    fn evaluator(entry: &'static EntryPoint, text: Option<&str>) -> Evaluator {
        let locator = match text {
            Some(text) => FixedLocator::new(CallSite::new("fixture.rs", 1, 1, text)),
            None => FixedLocator::none(),
        };
        Evaluator::new(Settings::default(), Box::new(locator), entry, OnFailure::Fail)
    }

    #[test]
    fn test_true_and_nil_succeed_silently() {
        let mut t = Recorder::new();
        let eval = evaluator(&CHECK, None);
        assert!(eval.evaluate(&mut t, Condition::Bool(true), &[]).ok);
        assert!(eval.evaluate(&mut t, Condition::Error(None), &[]).ok);
        assert!(t.logs.is_empty());
        assert!(!t.failed);
    }

    #[test]
    fn test_false_uses_source_text() {
        let mut t = Recorder::new();
        let eval = evaluator(&CHECK, Some("check(&mut t, total != 10, &[])"));
        let result = eval.evaluate(&mut t, Condition::Bool(false), &[]);
        assert!(!result.ok);
        assert_eq!(t.logs, vec!["assertion failed: total is 10"]);
        assert!(t.failed);
        assert!(!t.failed_now);
    }

    #[test]
    fn test_false_without_source() {
        let mut t = Recorder::new();
        let eval = evaluator(&CHECK, None);
        eval.evaluate(&mut t, Condition::Bool(false), &[&"count={}", &3]);
        assert_eq!(t.last_log(), Some("assertion failed: condition is false: count=3"));
    }

    #[test]
    fn test_source_lookup_can_be_disabled() {
        let mut t = Recorder::new();
        let settings = Settings {
            source_lookup: false,
            ..Settings::default()
        };
        let locator = FixedLocator::new(CallSite::new("f.rs", 1, 1, "check(&mut t, ready, &[])"));
        let eval = Evaluator::new(settings, Box::new(locator), &CHECK, OnFailure::FailNow);
        eval.evaluate(&mut t, Condition::Bool(false), &[]);
        assert_eq!(t.last_log(), Some("assertion failed: condition is false"));
        assert!(t.failed_now);
    }

    #[inline(never)]
    fn verify_ready(eval: &Evaluator, t: &mut Recorder, ready: bool) -> Evaluation {
        eval.evaluate(t, Condition::Bool(ready), &[])
    }

    #[test]
    fn test_skipped_frame_without_entry_point_call_falls_back() {
        let mut t = Recorder::new();
        let eval = Evaluator::new(
            Settings::default(),
            Box::new(BacktraceLocator),
            &CHECK,
            OnFailure::Fail,
        )
        .skip_frames(1);
        let result = verify_ready(&eval, &mut t, false);
        assert!(!result.ok);
        assert_eq!(t.logs, vec!["assertion failed: condition is false"]);
    }

    #[test]
    fn test_error_condition() {
        let mut t = Recorder::new();
        let eval = evaluator(&CHECK, None);
        let result: Result<(), String> = Err("disk full".to_string());
        eval.evaluate(&mut t, Condition::from(&result), &[]);
        assert_eq!(t.last_log(), Some("assertion failed: error is not nil: disk full"));
    }

    #[test]
    fn test_comparison_message_used_verbatim() {
        let mut t = Recorder::new();
        let eval = evaluator(&CHECK, Some("check(&mut t, custom(), &[])"));
        let cmp = Comparison::new(|| Outcome::failure("widgets differ"));
        eval.evaluate(&mut t, Condition::Comparison(cmp), &[]);
        assert_eq!(t.logs, vec!["assertion failed: widgets differ"]);
    }

    #[test]
    fn test_operands_rendered_with_labels() {
        let mut t = Recorder::new();
        let eval = evaluator(&EQUAL, Some("equal(&mut t, count, 2, &[])"));
        let (count, want) = (1, 2);
        eval.evaluate(&mut t, crate::cmp::equal(&count, &want).into(), &[]);
        assert_eq!(
            t.last_log(),
            Some("assertion failed: 1 (count i32) != 2 (i32)")
        );
    }

    #[test]
    #[should_panic(expected = "contract violation: unsupported condition")]
    fn test_unsupported_condition_is_a_violation() {
        let mut t = Recorder::new();
        let condition = Condition::from_any(Box::new(7u8));
        evaluator(&CHECK, None).evaluate(&mut t, condition, &[]);
    }

    #[test]
    fn test_bool_phrasing() {
        let cases = [
            ("total != 10", "total is 10"),
            ("a == b", "a is not b"),
            ("n > 3", "n is <= 3"),
            ("n < 3", "n is >= 3"),
            ("n >= 3", "n is less than 3"),
            ("n <= 3", "n is greater than 3"),
            ("!done", "done is true"),
            ("ready", "ready is false"),
            ("self.ready", "self.ready is false"),
            ("a == b && c", "expression is false: a == b && c"),
            ("v.contains(&x)", "expression is false: v.contains(&x)"),
            ("Vec::<u8>::new().is_empty()", "expression is false: Vec::<u8>::new().is_empty()"),
            ("f(a == b)", "expression is false: f(a == b)"),
        ];
        for (expr, want) in cases {
            assert_eq!(bool_message(Some(expr)), want, "for {expr:?}");
        }
        assert_eq!(bool_message(None), "condition is false");
    }

    #[test]
    fn test_reference_sigils_are_not_part_of_labels() {
        let mut t = Recorder::new();
        let eval = evaluator(&CHECK, Some("check(&mut t, cmp::equal(&got, &mut want), &[])"));
        let (got, want) = (1, 2);
        eval.evaluate(&mut t, crate::cmp::equal(&got, &want).into(), &[]);
        assert_eq!(t.last_log(), Some("assertion failed: 1 (got i32) != 2 (want i32)"));
        assert_eq!(strip_reference("&&x"), "&x");
        assert_eq!(strip_reference("x"), "x");
    }

    #[test]
    fn test_operands_message_multiline() {
        let actual = Operand::of("a\nb\nc");
        let expected = Operand::of("a\nc");
        let labels = [Some("got".to_string()), Some("\"a\\nc\"".to_string())];
        let msg = operands_message(&[actual, expected], &labels, 2);
        assert!(msg.starts_with("values are not equal:\n--- expected\n+++ got\n"), "{msg}");
        assert!(msg.contains("\n+b"));
    }
}
