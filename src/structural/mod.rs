//! The structural comparator.
//!
//! Both operands are captured through `serde` into a [`Value`] tree and
//! walked side by side. Every differing leaf is recorded with its [`Path`],
//! so one failure lists all mismatches, not only the first.

pub mod options;
pub mod path;
pub mod serializer;
pub mod value;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::comparison::{Comparison, Operand, Outcome};
use crate::diff::{diff_operands, Side};
use crate::errors::{self, ContractViolation};

pub use options::EquivalenceOptions;
pub use path::{Path, PathPattern, PathStep};
pub use serializer::to_value;
pub use value::Value;

const MISSING: &str = "<missing>";

/// One differing location. `None` marks a side where the location does not
/// exist (a shorter sequence, an absent map key).
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub path: Path,
    pub x: Option<Value>,
    pub y: Option<Value>,
}

/// Builds a comparison of `x` (the actual value) against `y` (the
/// expected value).
///
/// Capturing either operand past the configured nesting limit is a
/// contract violation and panics when the comparison runs. The limit and
/// the diff context come from [`EquivalenceOptions::with_settings`], or
/// from the global settings when none were given.
pub fn deep_equal<'a, X, Y>(x: &'a X, y: &'a Y, options: &'a EquivalenceOptions) -> Comparison<'a>
where
    X: Serialize + ?Sized,
    Y: Serialize + ?Sized,
{
    Comparison::new(move || {
        if let Some(err) = options.invalid_paths().first() {
            return Outcome::Failure(err.to_string());
        }
        let settings = options.settings();
        let max_depth = settings.max_depth;
        let capture = |v: Result<Value, _>| match v {
            Ok(v) => v,
            Err(err) => errors::violation(ContractViolation::Uninspectable(err)),
        };
        let x = capture(to_value(x, max_depth));
        let y = capture(to_value(y, max_depth));

        let mismatches = compare_values(&x, &y, options);
        if mismatches.is_empty() {
            Outcome::Success
        } else {
            Outcome::Failure(render_mismatches(&mismatches, settings.diff_context))
        }
    })
}

/// Walks two captured values and returns every mismatch in traversal order.
pub fn compare_values(x: &Value, y: &Value, options: &EquivalenceOptions) -> Vec<Mismatch> {
    let mut walker = Walker {
        options,
        mismatches: Vec::new(),
    };
    walker.walk(&Path::root(), x, y);
    walker.mismatches
}

/// Renders mismatches as `values are not equal:` followed by one entry
/// per path.
pub fn render_mismatches(mismatches: &[Mismatch], context: usize) -> String {
    let mut out = String::from("values are not equal:");
    for mismatch in mismatches {
        let x = operand(mismatch.x.as_ref());
        let y = operand(mismatch.y.as_ref());
        let report = diff_operands(&y, &x, context);
        let side = |v: Option<&Value>| Side::new(None, v.map(Value::type_name));
        let rendered = report.render(side(mismatch.y.as_ref()), side(mismatch.x.as_ref()));
        if report.is_multiline() {
            out.push_str(&format!("\n  {}:", mismatch.path));
            for line in rendered.lines() {
                out.push_str("\n    ");
                out.push_str(line);
            }
        } else {
            out.push_str(&format!("\n  {}: {}", mismatch.path, rendered));
        }
    }
    out
}

fn operand(value: Option<&Value>) -> Operand {
    match value {
        None => Operand::new(MISSING, ""),
        Some(v) => {
            let op = Operand::new(v.to_string(), v.type_name());
            match v.as_str() {
                Some(text) => op.with_text(text),
                None => op,
            }
        }
    }
}

struct Walker<'o> {
    options: &'o EquivalenceOptions,
    mismatches: Vec<Mismatch>,
}

impl Walker<'_> {
    fn mismatch(&mut self, path: &Path, x: Option<&Value>, y: Option<&Value>) {
        self.mismatches.push(Mismatch {
            path: path.clone(),
            x: x.cloned(),
            y: y.cloned(),
        });
    }

    fn walk(&mut self, path: &Path, x: &Value, y: &Value) {
        let options = self.options;
        if x.type_name() == y.type_name() {
            if let Some(equal) = options.equality_for(x.type_name()) {
                if !equal(x, y) {
                    self.mismatch(path, Some(x), Some(y));
                }
                return;
            }
        }

        match (x, y) {
            (Value::Float(a), Value::Float(b)) => {
                if !options.floats_equal(*a, *b) {
                    self.mismatch(path, Some(x), Some(y));
                }
            }
            (Value::Option(a), Value::Option(b)) => match (a, b) {
                (Some(a), Some(b)) => self.walk(path, a, b),
                (None, None) => {}
                _ => self.mismatch(path, Some(x), Some(y)),
            },
            (Value::Seq(a), Value::Seq(b)) => self.walk_items(path, a, b),
            (
                Value::TupleStruct { name: na, items: a },
                Value::TupleStruct { name: nb, items: b },
            ) if na == nb => self.walk_items(path, a, b),
            (
                Value::Struct {
                    name: na,
                    fields: a,
                },
                Value::Struct {
                    name: nb,
                    fields: b,
                },
            ) if na == nb => self.walk_fields(path, na, a, b),
            (Value::Map(a), Value::Map(b)) => self.walk_entries(path, a, b),
            (
                Value::Variant {
                    enum_name: ea,
                    variant: va,
                    payload: pa,
                },
                Value::Variant {
                    enum_name: eb,
                    variant: vb,
                    payload: pb,
                },
            ) if ea == eb && va == vb => self.walk(path, pa, pb),
            _ => {
                if x != y {
                    self.mismatch(path, Some(x), Some(y));
                }
            }
        }
    }

    fn walk_child(&mut self, path: Path, x: Option<&Value>, y: Option<&Value>) {
        if self.options.skips_path(&path, x, y) {
            return;
        }
        match (x, y) {
            (Some(x), Some(y)) => self.walk(&path, x, y),
            (None, None) => {}
            _ => self.mismatch(&path, x, y),
        }
    }

    fn walk_items(&mut self, path: &Path, a: &[Value], b: &[Value]) {
        for i in 0..a.len().max(b.len()) {
            self.walk_child(path.child(PathStep::Index(i)), a.get(i), b.get(i));
        }
    }

    fn walk_fields(
        &mut self,
        path: &Path,
        type_name: &str,
        a: &[(&'static str, Value)],
        b: &[(&'static str, Value)],
    ) {
        let mut names: Vec<&'static str> = a.iter().map(|(name, _)| *name).collect();
        for (name, _) in b {
            if !names.contains(name) {
                names.push(*name);
            }
        }
        for name in names {
            if self.options.skips_field(type_name, name) {
                continue;
            }
            let x = field(a, name);
            let y = field(b, name);
            self.walk_child(path.child(PathStep::Field(name)), x, y);
        }
    }

    fn walk_entries(&mut self, path: &Path, a: &[(Value, Value)], b: &[(Value, Value)]) {
        let a = keyed(a);
        let b = keyed(b);
        let mut keys: Vec<&String> = a.keys().chain(b.keys()).collect();
        keys.sort();
        keys.dedup();
        for key in keys {
            let x = a.get(key).copied();
            let y = b.get(key).copied();
            self.walk_child(path.child(PathStep::Key(key.clone())), x, y);
        }
    }
}

fn field<'v>(fields: &'v [(&'static str, Value)], name: &str) -> Option<&'v Value> {
    fields.iter().find(|(f, _)| *f == name).map(|(_, v)| v)
}

/// Map entries by key rendering, which orders them deterministically.
fn keyed(entries: &[(Value, Value)]) -> BTreeMap<String, &Value> {
    entries.iter().map(|(k, v)| (k.to_string(), v)).collect()
}
