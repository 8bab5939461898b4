//! The comparison protocol.
//!
//! A [`Comparison`] is a deferred, side-effect-free check. It is built
//! fresh for one evaluation, run exactly once and produces an [`Outcome`].

use std::fmt;

/// Result of running a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success,
    /// Failure with a complete message, used verbatim.
    Failure(String),
    /// Failure without a message. The engine renders one from the
    /// operands and the source text of the call.
    FailureUnknown(Vec<Operand>),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure(message.into())
    }
}

/// A deferred check producing an [`Outcome`].
pub struct Comparison<'a> {
    run: Box<dyn FnOnce() -> Outcome + 'a>,
}

impl<'a> Comparison<'a> {
    pub fn new(run: impl FnOnce() -> Outcome + 'a) -> Self {
        Self { run: Box::new(run) }
    }

    /// Runs the comparison, consuming it.
    pub fn run(self) -> Outcome {
        (self.run)()
    }
}

impl fmt::Debug for Comparison<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparison(..)")
    }
}

/// A runtime value taking part in a failed comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    rendered: String,
    type_name: String,
    text: Option<String>,
}

impl Operand {
    pub fn new(rendered: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            rendered: rendered.into(),
            type_name: type_name.into(),
            text: None,
        }
    }

    /// Captures `value` through its `Debug` rendering. String values keep
    /// their raw text as well so they can be diffed line by line.
    pub fn of<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        let rendered = format!("{value:?}");
        let full_name = std::any::type_name::<T>();
        let text = if is_text_type(full_name) {
            unescape_debug_str(&rendered)
        } else {
            None
        };
        Self {
            rendered,
            type_name: short_type_name(full_name),
            text,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Raw text, for string operands.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Strips module paths from a type name:
/// `core::option::Option<alloc::string::String>` becomes `Option<String>`.
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            segment.push(c);
            continue;
        }
        out.push_str(last_path_segment(&segment));
        segment.clear();
        out.push(c);
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

fn is_text_type(full: &str) -> bool {
    let bare = full.trim_start_matches('&').trim_start_matches("mut ");
    matches!(
        bare,
        "str" | "alloc::string::String" | "alloc::borrow::Cow<str>" | "alloc::boxed::Box<str>"
    )
}

/// Reverses the escaping applied by `<str as Debug>`. Returns `None` when
/// `rendered` is not a quoted string.
fn unescape_debug_str(rendered: &str) -> Option<String> {
    let inner = rendered.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'u' => {
                if chars.next()? != '{' {
                    return None;
                }
                let hex: String = chars.by_ref().take_while(|&c| c != '}').collect();
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    Some(out)
}
