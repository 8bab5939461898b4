//! Comparison constructors.
//!
//! Each function returns a [`Comparison`] that can be passed to
//! [`assert`](crate::assert::assert) or [`check`](crate::assert::check), or
//! is used by the dedicated entry points in [`crate::assert`].

use std::any::type_name;
use std::error::Error;
use std::fmt::{Debug, Display};

use serde::Serialize;

use crate::comparison::{short_type_name, Comparison, Operand, Outcome};
use crate::structural::{self, EquivalenceOptions};

/// Succeeds when `x == y`.
///
/// On failure the operands are handed back to the engine, which renders
/// them together with their source text.
pub fn equal<'a, X, Y>(x: &'a X, y: &'a Y) -> Comparison<'a>
where
    X: PartialEq<Y> + Debug + ?Sized,
    Y: Debug + ?Sized,
{
    Comparison::new(move || {
        if x == y {
            Outcome::Success
        } else {
            Outcome::FailureUnknown(vec![Operand::of(x), Operand::of(y)])
        }
    })
}

/// Succeeds when `x` and `y` are structurally equal under `options`.
/// See [`crate::structural`].
pub fn deep_equal<'a, X, Y>(x: &'a X, y: &'a Y, options: &'a EquivalenceOptions) -> Comparison<'a>
where
    X: Serialize + ?Sized,
    Y: Serialize + ?Sized,
{
    structural::deep_equal(x, y, options)
}

/// Succeeds when `result` is an error whose message is exactly `message`.
pub fn error<'a, T, E: Display>(result: &'a Result<T, E>, message: &'a str) -> Comparison<'a> {
    Comparison::new(move || match result {
        Ok(_) => Outcome::failure("expected an error, got nil"),
        Err(err) => {
            let got = err.to_string();
            if got == message {
                Outcome::Success
            } else {
                Outcome::failure(format!(
                    "expected error {message:?}, got {got:?} ({})",
                    name_of::<E>()
                ))
            }
        }
    })
}

/// Succeeds when `result` is an error whose message contains `substring`.
pub fn error_contains<'a, T, E: Display>(
    result: &'a Result<T, E>,
    substring: &'a str,
) -> Comparison<'a> {
    Comparison::new(move || match result {
        Ok(_) => Outcome::failure("expected an error, got nil"),
        Err(err) => {
            let got = err.to_string();
            if got.contains(substring) {
                Outcome::Success
            } else {
                Outcome::failure(format!(
                    "expected error to contain {substring:?}, got {got:?} ({})",
                    name_of::<E>()
                ))
            }
        }
    })
}

/// Succeeds when `expected` equals the error in `result` or any error in
/// its [`source`](Error::source) chain.
pub fn error_is<'a, T, E, X>(result: &'a Result<T, E>, expected: &'a X) -> Comparison<'a>
where
    E: Error + 'static,
    X: Error + PartialEq + 'static,
{
    Comparison::new(move || {
        let err = match result {
            Ok(_) => {
                return Outcome::failure(format!(
                    "error is nil, not {:?} ({})",
                    expected.to_string(),
                    name_of::<X>()
                ))
            }
            Err(err) => err,
        };
        let mut current: Option<&(dyn Error + 'static)> = Some(err);
        while let Some(e) = current {
            if e.downcast_ref::<X>() == Some(expected) {
                return Outcome::Success;
            }
            current = e.source();
        }
        Outcome::failure(format!(
            "error is {:?} ({}), not {:?} ({})",
            err.to_string(),
            name_of::<E>(),
            expected.to_string(),
            name_of::<X>()
        ))
    })
}

/// Succeeds when the error in `result` is of type `X`. Only the error
/// itself is checked, not its source chain.
pub fn error_type<'a, X, T, E>(result: &'a Result<T, E>) -> Comparison<'a>
where
    X: Error + 'static,
    E: Error + 'static,
{
    Comparison::new(move || match result {
        Ok(_) => Outcome::failure(format!("error is nil, not {}", name_of::<X>())),
        Err(err) => {
            let err: &(dyn Error + 'static) = err;
            if err.is::<X>() {
                Outcome::Success
            } else {
                Outcome::failure(format!(
                    "error is {:?} ({}), not {}",
                    err.to_string(),
                    name_of::<E>(),
                    name_of::<X>()
                ))
            }
        }
    })
}

/// Succeeds when `result` is an error accepted by `predicate`.
pub fn error_matches<'a, T, E, F>(result: &'a Result<T, E>, predicate: F) -> Comparison<'a>
where
    E: Error + 'static,
    F: FnOnce(&(dyn Error + 'static)) -> bool + 'a,
{
    Comparison::new(move || match result {
        Ok(_) => Outcome::failure("expected an error, got nil"),
        Err(err) => {
            let err: &(dyn Error + 'static) = err;
            if predicate(err) {
                Outcome::Success
            } else {
                Outcome::failure(format!(
                    "error {:?} ({}) does not match the predicate",
                    err.to_string(),
                    name_of::<E>()
                ))
            }
        }
    })
}

fn name_of<T: ?Sized>() -> String {
    short_type_name(type_name::<T>())
}
