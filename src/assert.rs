//! Assertion entry points.
//!
//! Every entry point takes the host capability first and, except
//! [`deep_equal`], a trailing message-and-args slice. They are all
//! `#[track_caller]` and resolve their call site at skip depth 0: the
//! source shown in a failure message is the call to the entry point
//! itself. Helpers that wrap an entry point and want their own caller's
//! source shown should build an [`Evaluator`](crate::engine::Evaluator)
//! with `skip_frames` and the backtrace locator instead.
//!
//! ```rust
//! use attest::host::Recorder;
//!
//! let mut t = Recorder::new();
//! let total = 10;
//! attest::check(&mut t, total != 10, &[]);
//! assert!(t.failed);
//! assert!(t.output().starts_with("assertion failed: "));
//! ```

use std::error::Error;
use std::fmt::{Debug, Display};
use std::panic::Location;

use serde::Serialize;

use crate::cmp;
use crate::condition::Condition;
use crate::engine::{Evaluator, OnFailure};
use crate::host::TestingT;
use crate::source::{EntryPoint, OperandSource};
use crate::structural::EquivalenceOptions;

// ============================================================================
// SIGNATURES
// ============================================================================

pub static ASSERT: EntryPoint = EntryPoint {
    name: "assert",
    params: &["t", "condition", "msg_and_args"],
    variadic: true,
    condition: Some("condition"),
    operands: OperandSource::ComparisonCall("condition"),
};

pub static CHECK: EntryPoint = EntryPoint {
    name: "check",
    params: &["t", "condition", "msg_and_args"],
    variadic: true,
    condition: Some("condition"),
    operands: OperandSource::ComparisonCall("condition"),
};

pub static NIL_ERROR: EntryPoint = EntryPoint {
    name: "nil_error",
    params: &["t", "result", "msg_and_args"],
    variadic: true,
    condition: None,
    operands: OperandSource::Params(&[]),
};

pub static EQUAL: EntryPoint = EntryPoint {
    name: "equal",
    params: &["t", "x", "y", "msg_and_args"],
    variadic: true,
    condition: None,
    operands: OperandSource::Params(&["x", "y"]),
};

pub static DEEP_EQUAL: EntryPoint = EntryPoint {
    name: "deep_equal",
    params: &["t", "x", "y", "options"],
    variadic: false,
    condition: None,
    operands: OperandSource::Params(&["x", "y"]),
};

pub static ERROR: EntryPoint = EntryPoint {
    name: "error",
    params: &["t", "result", "message", "msg_and_args"],
    variadic: true,
    condition: None,
    operands: OperandSource::Params(&[]),
};

pub static ERROR_CONTAINS: EntryPoint = EntryPoint {
    name: "error_contains",
    params: &["t", "result", "substring", "msg_and_args"],
    variadic: true,
    condition: None,
    operands: OperandSource::Params(&[]),
};

pub static ERROR_IS: EntryPoint = EntryPoint {
    name: "error_is",
    params: &["t", "result", "expected", "msg_and_args"],
    variadic: true,
    condition: None,
    operands: OperandSource::Params(&[]),
};

pub static ERROR_TYPE: EntryPoint = EntryPoint {
    name: "error_type",
    params: &["t", "result", "msg_and_args"],
    variadic: true,
    condition: None,
    operands: OperandSource::Params(&[]),
};

fn evaluate(
    entry: &'static EntryPoint,
    on_failure: OnFailure,
    location: &'static Location<'static>,
    mut t: impl TestingT,
    condition: Condition<'_>,
    msg_and_args: &[&dyn Display],
) -> bool {
    Evaluator::for_caller(entry, on_failure, location)
        .evaluate(&mut t, condition, msg_and_args)
        .ok
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Fails the test immediately when `condition` does not hold.
///
/// `condition` is a `bool`, a `Result` (an `Err` fails) or a
/// [`Comparison`](crate::Comparison) from [`crate::cmp`].
#[track_caller]
pub fn assert<'a>(
    t: &mut (impl TestingT + ?Sized),
    condition: impl Into<Condition<'a>>,
    msg_and_args: &[&dyn Display],
) {
    evaluate(
        &ASSERT,
        OnFailure::FailNow,
        Location::caller(),
        t,
        condition.into(),
        msg_and_args,
    );
}

/// Like [`assert`], but marks the test failed and lets it continue.
/// Returns whether the condition held.
#[track_caller]
pub fn check<'a>(
    t: &mut (impl TestingT + ?Sized),
    condition: impl Into<Condition<'a>>,
    msg_and_args: &[&dyn Display],
) -> bool {
    evaluate(
        &CHECK,
        OnFailure::Fail,
        Location::caller(),
        t,
        condition.into(),
        msg_and_args,
    )
}

/// Fails the test immediately when `result` is an `Err`.
#[track_caller]
pub fn nil_error<T, E: Display>(
    t: &mut (impl TestingT + ?Sized),
    result: &Result<T, E>,
    msg_and_args: &[&dyn Display],
) {
    evaluate(
        &NIL_ERROR,
        OnFailure::FailNow,
        Location::caller(),
        t,
        Condition::from(result),
        msg_and_args,
    );
}

/// Fails the test immediately unless `x == y`. `x` is the actual value,
/// `y` the expected one.
#[track_caller]
pub fn equal<X, Y>(
    t: &mut (impl TestingT + ?Sized),
    x: X,
    y: Y,
    msg_and_args: &[&dyn Display],
) where
    X: PartialEq<Y> + Debug,
    Y: Debug,
{
    evaluate(
        &EQUAL,
        OnFailure::FailNow,
        Location::caller(),
        t,
        cmp::equal(&x, &y).into(),
        msg_and_args,
    );
}

/// Fails the test immediately unless `x` and `y` are structurally equal
/// under `options`. See [`crate::structural`].
#[track_caller]
pub fn deep_equal<X, Y>(
    t: &mut (impl TestingT + ?Sized),
    x: &X,
    y: &Y,
    options: &EquivalenceOptions,
) where
    X: Serialize + ?Sized,
    Y: Serialize + ?Sized,
{
    evaluate(
        &DEEP_EQUAL,
        OnFailure::FailNow,
        Location::caller(),
        t,
        cmp::deep_equal(x, y, options).into(),
        &[],
    );
}

/// Fails the test immediately unless `result` is an error whose message is
/// exactly `message`.
#[track_caller]
pub fn error<T, E: Display>(
    t: &mut (impl TestingT + ?Sized),
    result: &Result<T, E>,
    message: &str,
    msg_and_args: &[&dyn Display],
) {
    evaluate(
        &ERROR,
        OnFailure::FailNow,
        Location::caller(),
        t,
        cmp::error(result, message).into(),
        msg_and_args,
    );
}

/// Fails the test immediately unless `result` is an error whose message
/// contains `substring`.
#[track_caller]
pub fn error_contains<T, E: Display>(
    t: &mut (impl TestingT + ?Sized),
    result: &Result<T, E>,
    substring: &str,
    msg_and_args: &[&dyn Display],
) {
    evaluate(
        &ERROR_CONTAINS,
        OnFailure::FailNow,
        Location::caller(),
        t,
        cmp::error_contains(result, substring).into(),
        msg_and_args,
    );
}

/// Fails the test immediately unless `expected` is the error in `result`
/// or one of its sources.
#[track_caller]
pub fn error_is<T, E, X>(
    t: &mut (impl TestingT + ?Sized),
    result: &Result<T, E>,
    expected: &X,
    msg_and_args: &[&dyn Display],
) where
    E: Error + 'static,
    X: Error + PartialEq + 'static,
{
    evaluate(
        &ERROR_IS,
        OnFailure::FailNow,
        Location::caller(),
        t,
        cmp::error_is(result, expected).into(),
        msg_and_args,
    );
}

/// Fails the test immediately unless the error in `result` is an `X`.
///
/// ```rust
/// use attest::host::Recorder;
///
/// let mut t = Recorder::new();
/// let result: Result<(), std::fmt::Error> = Err(std::fmt::Error);
/// attest::error_type::<std::fmt::Error, _, _>(&mut t, &result, &[]);
/// assert!(!t.failed);
/// ```
#[track_caller]
pub fn error_type<X, T, E>(
    t: &mut (impl TestingT + ?Sized),
    result: &Result<T, E>,
    msg_and_args: &[&dyn Display],
) where
    X: Error + 'static,
    E: Error + 'static,
{
    evaluate(
        &ERROR_TYPE,
        OnFailure::FailNow,
        Location::caller(),
        t,
        cmp::error_type::<X, T, E>(result).into(),
        msg_and_args,
    );
}
