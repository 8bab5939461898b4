//! The value an assertion evaluates.

use std::any::Any;
use std::fmt;

use crate::comparison::{short_type_name, Comparison};

/// A pass/fail condition: a boolean, an error state or a comparison.
#[derive(Debug)]
pub enum Condition<'a> {
    Bool(bool),
    /// `None` is success, `Some` carries the error that occurred.
    Error(Option<ErrorValue>),
    Comparison(Comparison<'a>),
    /// Produced only by [`Condition::from_any`] for values of any other
    /// type. Evaluating it is a contract violation.
    Unsupported { type_name: String },
}

/// A captured error: its rendered message and its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    pub message: String,
    pub type_name: String,
}

impl ErrorValue {
    pub fn of<E: fmt::Display + ?Sized>(err: &E) -> Self {
        Self {
            message: err.to_string(),
            type_name: short_type_name(std::any::type_name::<E>()),
        }
    }
}

impl Condition<'static> {
    /// Classifies a dynamically typed value. Recognises `bool`,
    /// `Option<Box<dyn Error>>`, `Box<dyn Error>` and [`Comparison`];
    /// anything else becomes [`Condition::Unsupported`].
    pub fn from_any(value: Box<dyn Any>) -> Self {
        let value = match value.downcast::<bool>() {
            Ok(b) => return Condition::Bool(*b),
            Err(other) => other,
        };
        let value = match value.downcast::<Comparison<'static>>() {
            Ok(cmp) => return Condition::Comparison(*cmp),
            Err(other) => other,
        };
        let value = match value.downcast::<Box<dyn std::error::Error + Send + Sync>>() {
            Ok(err) => return Condition::Error(Some(ErrorValue::of(&**err))),
            Err(other) => other,
        };
        match value.downcast::<Option<Box<dyn std::error::Error + Send + Sync>>>() {
            Ok(err) => Condition::Error(err.as_deref().map(|e| ErrorValue::of(e))),
            Err(other) => Condition::Unsupported {
                type_name: any_type_name(&*other),
            },
        }
    }
}

impl Condition<'_> {
    pub fn from_error<E: std::error::Error + ?Sized>(err: Option<&E>) -> Self {
        Condition::Error(err.map(ErrorValue::of))
    }
}

fn any_type_name(value: &dyn Any) -> String {
    // `dyn Any` only exposes a `TypeId`; report what can be named.
    if value.is::<String>() || value.is::<&str>() {
        return "string".to_string();
    }
    if value.is::<i32>() || value.is::<i64>() || value.is::<u32>() || value.is::<u64>() {
        return "integer".to_string();
    }
    format!("{:?}", value.type_id())
}

impl From<bool> for Condition<'_> {
    fn from(value: bool) -> Self {
        Condition::Bool(value)
    }
}

impl<'a> From<Comparison<'a>> for Condition<'a> {
    fn from(value: Comparison<'a>) -> Self {
        Condition::Comparison(value)
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Condition<'_> {
    fn from(value: Result<T, E>) -> Self {
        Condition::Error(value.err().as_ref().map(ErrorValue::of))
    }
}

impl<T, E: fmt::Display> From<&Result<T, E>> for Condition<'_> {
    fn from(value: &Result<T, E>) -> Self {
        Condition::Error(value.as_ref().err().map(ErrorValue::of))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::Outcome;

    #[test]
    fn test_from_result() {
        let ok: Result<u8, std::fmt::Error> = Ok(1);
        assert!(matches!(Condition::from(ok), Condition::Error(None)));

        let err: Result<u8, String> = Err("disk full".to_string());
        match Condition::from(&err) {
            Condition::Error(Some(e)) => {
                assert_eq!(e.message, "disk full");
                assert_eq!(e.type_name, "String");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_from_any_classifies() {
        assert!(matches!(Condition::from_any(Box::new(true)), Condition::Bool(true)));

        let cmp: Comparison<'static> = Comparison::new(|| Outcome::Success);
        assert!(matches!(
            Condition::from_any(Box::new(cmp)),
            Condition::Comparison(_)
        ));

        let err: Option<Box<dyn std::error::Error + Send + Sync>> = Some("boom".into());
        match Condition::from_any(Box::new(err)) {
            Condition::Error(Some(e)) => assert_eq!(e.message, "boom"),
            other => panic!("unexpected {other:?}"),
        }

        match Condition::from_any(Box::new(String::from("yes"))) {
            Condition::Unsupported { type_name } => assert_eq!(type_name, "string"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
