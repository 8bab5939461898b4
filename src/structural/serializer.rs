//! Captures any `Serialize` value as a [`Value`].
//!
//! Nesting is bounded: a value deeper than the configured limit fails with
//! [`ValueError::DepthLimit`]. That is also how a cyclic graph (for
//! example `Rc<RefCell<Node>>` pointing back at itself) ends.

use serde::ser::{self, Serialize};

use crate::errors::ValueError;
use crate::structural::value::Value;

/// Captures `value`, allowing at most `max_depth` levels of nesting.
pub fn to_value<T: Serialize + ?Sized>(value: &T, max_depth: usize) -> Result<Value, ValueError> {
    value.serialize(ValueSerializer {
        depth: 0,
        max_depth,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct ValueSerializer {
    depth: usize,
    max_depth: usize,
}

impl ValueSerializer {
    /// The serializer for the children of the current value.
    fn nested(self) -> Result<Self, ValueError> {
        if self.depth >= self.max_depth {
            return Err(ValueError::DepthLimit(self.max_depth));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }

    fn child<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, ValueError> {
        value.serialize(self.nested()?)
    }
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = ValueError;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = TupleStructBuilder;
    type SerializeTupleVariant = TupleVariantBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = StructBuilder;
    type SerializeStructVariant = StructVariantBuilder;

    fn serialize_bool(self, v: bool) -> Result<Value, ValueError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, ValueError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, ValueError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, ValueError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, ValueError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, ValueError> {
        Ok(Value::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, ValueError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, ValueError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, ValueError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, ValueError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, ValueError> {
        Ok(match i128::try_from(v) {
            Ok(n) => Value::Int(n),
            Err(_) => Value::Float(v as f64),
        })
    }

    fn serialize_f32(self, v: f32) -> Result<Value, ValueError> {
        Ok(Value::Float(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, ValueError> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, ValueError> {
        Ok(Value::Char(v))
    }

    fn serialize_str(self, v: &str) -> Result<Value, ValueError> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, ValueError> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value, ValueError> {
        Ok(Value::Option(None))
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, ValueError> {
        Ok(Value::Option(Some(Box::new(self.child(value)?))))
    }

    fn serialize_unit(self) -> Result<Value, ValueError> {
        Ok(Value::Unit)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value, ValueError> {
        Ok(Value::Struct {
            name,
            fields: Vec::new(),
        })
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, ValueError> {
        Ok(Value::Variant {
            enum_name: name,
            variant,
            payload: Box::new(Value::Unit),
        })
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value, ValueError> {
        Ok(Value::TupleStruct {
            name,
            items: vec![self.child(value)?],
        })
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, ValueError> {
        Ok(Value::Variant {
            enum_name: name,
            variant,
            payload: Box::new(self.child(value)?),
        })
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, ValueError> {
        Ok(SeqBuilder {
            inner: self.nested()?,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, ValueError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<TupleStructBuilder, ValueError> {
        Ok(TupleStructBuilder {
            name,
            seq: self.serialize_seq(Some(len))?,
        })
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<TupleVariantBuilder, ValueError> {
        Ok(TupleVariantBuilder {
            enum_name: name,
            variant,
            seq: self.serialize_seq(Some(len))?,
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, ValueError> {
        Ok(MapBuilder {
            inner: self.nested()?,
            entries: Vec::with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<StructBuilder, ValueError> {
        Ok(StructBuilder {
            inner: self.nested()?,
            name,
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<StructVariantBuilder, ValueError> {
        Ok(StructVariantBuilder {
            enum_name: name,
            fields: StructBuilder {
                inner: self.nested()?,
                name: variant,
                fields: Vec::with_capacity(len),
            },
        })
    }
}

// ============================================================================
// COMPOUND BUILDERS
// ============================================================================

pub struct SeqBuilder {
    inner: ValueSerializer,
    items: Vec<Value>,
}

impl SeqBuilder {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.items.push(value.serialize(self.inner)?);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Seq(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Seq(self.items))
    }
}

pub struct TupleStructBuilder {
    name: &'static str,
    seq: SeqBuilder,
}

impl ser::SerializeTupleStruct for TupleStructBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.seq.push(value)
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::TupleStruct {
            name: self.name,
            items: self.seq.items,
        })
    }
}

pub struct TupleVariantBuilder {
    enum_name: &'static str,
    variant: &'static str,
    seq: SeqBuilder,
}

impl ser::SerializeTupleVariant for TupleVariantBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        self.seq.push(value)
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Variant {
            enum_name: self.enum_name,
            variant: self.variant,
            payload: Box::new(Value::Seq(self.seq.items)),
        })
    }
}

pub struct MapBuilder {
    inner: ValueSerializer,
    entries: Vec<(Value, Value)>,
    key: Option<Value>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), ValueError> {
        self.key = Some(key.serialize(self.inner)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ValueError> {
        let key = self
            .key
            .take()
            .ok_or_else(|| ValueError::Custom("map value serialized before its key".to_string()))?;
        self.entries.push((key, value.serialize(self.inner)?));
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Map(self.entries))
    }
}

pub struct StructBuilder {
    inner: ValueSerializer,
    name: &'static str,
    fields: Vec<(&'static str, Value)>,
}

impl ser::SerializeStruct for StructBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ValueError> {
        self.fields.push((key, value.serialize(self.inner)?));
        Ok(())
    }

    fn end(self) -> Result<Value, ValueError> {
        Ok(Value::Struct {
            name: self.name,
            fields: self.fields,
        })
    }
}

pub struct StructVariantBuilder {
    enum_name: &'static str,
    fields: StructBuilder,
}

impl ser::SerializeStructVariant for StructVariantBuilder {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ValueError> {
        ser::SerializeStruct::serialize_field(&mut self.fields, key, value)
    }

    fn end(self) -> Result<Value, ValueError> {
        let variant = self.fields.name;
        Ok(Value::Variant {
            enum_name: self.enum_name,
            variant,
            payload: Box::new(ser::SerializeStruct::end(self.fields)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize)]
    struct Meters(f64);

    #[derive(Serialize)]
    enum Shape {
        Empty,
        Circle { r: u8 },
        Line(Point, Point),
    }

    #[test]
    fn test_captures_structs_and_leaves() {
        let v = to_value(&Point { x: 1, y: -2 }, 8).unwrap();
        assert_eq!(
            v,
            Value::Struct {
                name: "Point",
                fields: vec![("x", Value::Int(1)), ("y", Value::Int(-2))],
            }
        );
        assert_eq!(
            to_value(&Meters(1.5), 8).unwrap(),
            Value::TupleStruct {
                name: "Meters",
                items: vec![Value::Float(1.5)],
            }
        );
        assert_eq!(to_value(&u128::MAX, 8).unwrap().type_name(), "float");
        assert_eq!(to_value("hi", 8).unwrap(), Value::Str("hi".into()));
    }

    #[test]
    fn test_captures_enums() {
        assert_eq!(to_value(&Shape::Empty, 8).unwrap().to_string(), "Empty");
        assert_eq!(
            to_value(&Shape::Circle { r: 2 }, 8).unwrap().to_string(),
            "Circle { r: 2 }"
        );
        let line = to_value(&Shape::Line(Point { x: 0, y: 0 }, Point { x: 1, y: 1 }), 8).unwrap();
        assert_eq!(line.type_name(), "Shape");
        assert_eq!(
            line.to_string(),
            "Line(Point { x: 0, y: 0 }, Point { x: 1, y: 1 })"
        );
    }

    #[test]
    fn test_captures_maps_in_order() {
        let mut m = BTreeMap::new();
        m.insert("b", 2);
        m.insert("a", 1);
        assert_eq!(to_value(&m, 8).unwrap().to_string(), "{\"a\": 1, \"b\": 2}");
    }

    #[derive(Serialize)]
    struct Node {
        next: Option<Rc<RefCell<Node>>>,
    }

    #[test]
    fn test_cycle_hits_depth_limit() {
        let node = Rc::new(RefCell::new(Node { next: None }));
        node.borrow_mut().next = Some(Rc::clone(&node));
        let err = to_value(&node, 16).unwrap_err();
        assert_eq!(err, ValueError::DepthLimit(16));
        // Break the cycle so the test does not leak.
        node.borrow_mut().next = None;
    }

    #[test]
    fn test_depth_limit_counts_levels() {
        let nested = vec![vec![vec![1]]];
        assert!(to_value(&nested, 3).is_ok());
        assert_eq!(to_value(&nested, 2).unwrap_err(), ValueError::DepthLimit(2));
    }
}
