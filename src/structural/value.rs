//! The inspectable value model that structural comparison works on.

use std::fmt;

/// A captured value.
///
/// # Examples
///
/// ```rust
/// use attest::structural::Value;
/// let v = Value::Int(3);
/// assert_eq!(v.type_name(), "int");
/// assert_eq!(v.to_string(), "3");
/// let s = Value::Struct { name: "Name", fields: vec![("first", Value::Str("a".into()))] };
/// assert_eq!(s.type_name(), "Name");
/// assert_eq!(s.to_string(), "Name { first: \"a\" }");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    /// Every integer type; `u128` values beyond `i128` become `Float`.
    Int(i128),
    Float(f64),
    Char(char),
    Str(String),
    Bytes(Vec<u8>),
    Option(Option<Box<Value>>),
    Seq(Vec<Value>),
    /// Entries in serialization order.
    Map(Vec<(Value, Value)>),
    Struct {
        name: &'static str,
        fields: Vec<(&'static str, Value)>,
    },
    /// Tuple and newtype structs.
    TupleStruct {
        name: &'static str,
        items: Vec<Value>,
    },
    Variant {
        enum_name: &'static str,
        variant: &'static str,
        payload: Box<Value>,
    },
}

impl Value {
    /// The type descriptor: the struct or enum name, or the kind of leaf.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Option(_) => "option",
            Value::Seq(_) => "seq",
            Value::Map(_) => "map",
            Value::Struct { name, .. } | Value::TupleStruct { name, .. } => *name,
            Value::Variant { enum_name, .. } => *enum_name,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Display formatting helpers
    // ------------------------------------------------------------------------

    fn fmt_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
        write!(f, "[")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        write!(f, "]")
    }

    fn fmt_tuple(f: &mut fmt::Formatter<'_>, name: &str, items: &[Value]) -> fmt::Result {
        write!(f, "{name}(")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}")?;
        }
        write!(f, ")")
    }

    fn fmt_map(f: &mut fmt::Formatter<'_>, entries: &[(Value, Value)]) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }

    fn fmt_fields(f: &mut fmt::Formatter<'_>, name: &str, fields: &[(&str, Value)]) -> fmt::Result {
        if fields.is_empty() {
            return write!(f, "{name}");
        }
        write!(f, "{name} {{ ")?;
        for (i, (field, value)) in fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}: {value}")?;
        }
        write!(f, " }}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n:?}"),
            Value::Char(c) => write!(f, "{c:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
            Value::Option(None) => write!(f, "None"),
            Value::Option(Some(inner)) => write!(f, "Some({inner})"),
            Value::Seq(items) => Value::fmt_seq(f, items),
            Value::Map(entries) => Value::fmt_map(f, entries),
            Value::Struct { name, fields } => Value::fmt_fields(f, name, fields),
            Value::TupleStruct { name, items } => Value::fmt_tuple(f, name, items),
            Value::Variant {
                variant, payload, ..
            } => match &**payload {
                Value::Unit => write!(f, "{variant}"),
                Value::Struct { fields, .. } => Value::fmt_fields(f, variant, fields),
                Value::Seq(items) => Value::fmt_tuple(f, variant, items),
                other => write!(f, "{variant}({other})"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested() {
        let v = Value::Map(vec![(
            Value::Str("k".into()),
            Value::Seq(vec![Value::Int(1), Value::Option(None), Value::Float(1.0)]),
        )]);
        assert_eq!(v.to_string(), "{\"k\": [1, None, 1.0]}");
    }

    #[test]
    fn test_display_variants() {
        let unit = Value::Variant {
            enum_name: "Shape",
            variant: "Empty",
            payload: Box::new(Value::Unit),
        };
        assert_eq!(unit.to_string(), "Empty");
        assert_eq!(unit.type_name(), "Shape");

        let tuple = Value::Variant {
            enum_name: "Shape",
            variant: "Line",
            payload: Box::new(Value::Seq(vec![Value::Int(1), Value::Int(2)])),
        };
        assert_eq!(tuple.to_string(), "Line(1, 2)");
    }
}
