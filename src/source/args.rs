//! The argument extractor: maps an entry point's formal parameters to the
//! literal source text supplied for them at the call site.

use crate::errors::SourceError;
use crate::source::lex::{is_ident_char, split_top_level, Scan};

/// Where the compared operands of an entry point come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandSource {
    /// The named parameters, in order (`equal(t, x, y, ..)`).
    Params(&'static [&'static str]),
    /// The arguments of the comparison call passed for the named
    /// parameter (`assert(t, cmp::equal(x, y), ..)`).
    ComparisonCall(&'static str),
}

/// The static signature of an assertion entry point.
///
/// The first parameter is always the host capability and is never bound.
/// When `variadic` is set the last parameter is the message-and-args
/// slot, which is not bound either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub variadic: bool,
    /// Parameter holding the condition, for boolean phrasing.
    pub condition: Option<&'static str>,
    pub operands: OperandSource,
}

impl EntryPoint {
    fn bound_params(&self) -> &'static [&'static str] {
        let end = if self.variadic {
            self.params.len().saturating_sub(1)
        } else {
            self.params.len()
        };
        self.params.get(1..end).unwrap_or(&[])
    }
}

/// Parameter name to argument source text, for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentBinding {
    pub entry: &'static str,
    args: Vec<(&'static str, String)>,
}

impl ArgumentBinding {
    pub fn get(&self, param: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(name, _)| *name == param)
            .map(|(_, text)| text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.args.iter().map(|(name, text)| (*name, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Source labels for the operands of a failed comparison; `None` where
    /// no text is available.
    pub fn operand_labels(&self, entry: &EntryPoint) -> Vec<Option<String>> {
        match entry.operands {
            OperandSource::Params(names) => names
                .iter()
                .map(|name| self.get(name).map(str::to_string))
                .collect(),
            OperandSource::ComparisonCall(param) => self
                .get(param)
                .and_then(parse_call)
                .map(|call| call.args.into_iter().map(Some).collect())
                .unwrap_or_default(),
        }
    }
}

/// A call expression split into callee and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub callee: String,
    pub args: Vec<String>,
}

/// Binds the arguments of the first call to `entry` found in `text`.
///
/// Fails with [`SourceError::Parse`] when `text` holds no call to the
/// entry point and with [`SourceError::ArityMismatch`] when the call's
/// argument count differs from the entry point's signature.
pub fn extract(text: &str, entry: &EntryPoint) -> Result<ArgumentBinding, SourceError> {
    let scan = Scan::new(text);
    let Some((open, close)) = find_call(&scan, entry.name) else {
        let first_line = text.lines().next().unwrap_or("").len();
        return Err(SourceError::parse(entry.name, text, (0, first_line)));
    };

    let args = split_top_level(&scan.slice(open + 1, close));
    if args.len() != entry.params.len() {
        return Err(SourceError::ArityMismatch {
            entry: entry.name.to_string(),
            expected: entry.params.len(),
            actual: args.len(),
        });
    }

    let bound = entry.bound_params();
    let args = bound
        .iter()
        .zip(args.into_iter().skip(1))
        .map(|(name, text)| (*name, text))
        .collect();
    Ok(ArgumentBinding {
        entry: entry.name,
        args,
    })
}

/// Parses `expr` as a single call `path(args..)` spanning the whole text.
pub fn parse_call(expr: &str) -> Option<Call> {
    let expr = expr.trim();
    let scan = Scan::new(expr);
    let open = (0..scan.len()).find(|&i| scan.chars[i] == '(' && scan.is_code(i))?;
    let close = scan.matching_close(open)?;
    if close + 1 != scan.len() || scan.chars[close] != ')' {
        return None;
    }
    let callee = scan.slice(0, open).trim().to_string();
    let is_path = !callee.is_empty()
        && callee
            .chars()
            .all(|c| is_ident_char(c) || matches!(c, ':' | '<' | '>' | ',' | ' ' | '&'));
    if !is_path {
        return None;
    }
    Some(Call {
        callee,
        args: split_top_level(&scan.slice(open + 1, close)),
    })
}

/// Whether `expr` is worth showing as a label: literals are not, since the
/// value already says everything they would.
pub fn is_printable_expr(expr: &str) -> bool {
    let expr = expr.trim();
    let Some(first) = expr.chars().next() else {
        return false;
    };
    let literal = first.is_ascii_digit()
        || (first == '-' && expr[1..].starts_with(|c: char| c.is_ascii_digit()))
        || matches!(first, '"' | '\'')
        || (expr.starts_with("r\"") || expr.starts_with("r#\""))
        || (expr.starts_with("b\"") || expr.starts_with("b'"))
        || matches!(expr, "true" | "false");
    !literal
}

/// Finds `name` used as a callee: an identifier, an optional turbofish,
/// then `(`. Returns the positions of the parentheses.
fn find_call(scan: &Scan, name: &str) -> Option<(usize, usize)> {
    let target: Vec<char> = name.chars().collect();
    let n = target.len();
    for start in 0..scan.len() {
        if start + n > scan.len() || scan.chars[start..start + n] != target[..] {
            continue;
        }
        if !(start..start + n).all(|i| scan.is_code(i)) {
            continue;
        }
        if start > 0 && is_ident_char(scan.chars[start - 1]) {
            continue;
        }
        let mut i = start + n;
        if scan.chars.get(i).is_some_and(|&c| is_ident_char(c)) {
            continue;
        }
        i = skip_whitespace(scan, i);
        if scan.chars.get(i) == Some(&':') && scan.chars.get(i + 1) == Some(&':') {
            // Turbofish: `name::<T>(..)`.
            let angle = skip_whitespace(scan, i + 2);
            if scan.chars.get(angle) != Some(&'<') {
                continue;
            }
            let Some(end) = scan.matching_close(angle) else {
                continue;
            };
            i = skip_whitespace(scan, end + 1);
        }
        if scan.chars.get(i) == Some(&'(') && scan.is_code(i) {
            if let Some(close) = scan.matching_close(i) {
                return Some((i, close));
            }
        }
    }
    None
}

fn skip_whitespace(scan: &Scan, mut i: usize) -> usize {
    while scan.chars.get(i).is_some_and(|c| c.is_whitespace()) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECK: EntryPoint = EntryPoint {
        name: "check",
        params: &["t", "condition", "msg_and_args"],
        variadic: true,
        condition: Some("condition"),
        operands: OperandSource::ComparisonCall("condition"),
    };

    const EQUAL: EntryPoint = EntryPoint {
        name: "equal",
        params: &["t", "x", "y", "msg_and_args"],
        variadic: true,
        condition: None,
        operands: OperandSource::Params(&["x", "y"]),
    };

    #[test]
    fn test_extract_binds_condition() {
        let binding = extract("check(&mut t, total != 10, &[])", &CHECK).unwrap();
        assert_eq!(binding.get("condition"), Some("total != 10"));
        assert_eq!(binding.len(), 1);
        assert_eq!(binding.get("t"), None);
        assert_eq!(binding.get("msg_and_args"), None);
    }

    #[test]
    fn test_extract_qualified_and_multiline() {
        let text = "attest::check(\n    &mut t,\n    matches!(v, Some(1, 2)),\n    &[&\"v={}\", &v],\n);";
        let binding = extract(text, &CHECK).unwrap();
        assert_eq!(binding.get("condition"), Some("matches!(v, Some(1, 2))"));
    }

    #[test]
    fn test_extract_rejects_other_calls() {
        let err = extract("checked(&mut t, ok, &[])", &CHECK).unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
        let err = extract("\"check(\"", &CHECK).unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }

    #[test]
    fn test_extract_arity_must_match() {
        let err = extract("check(&mut t, ok)", &CHECK).unwrap_err();
        assert!(matches!(
            err,
            SourceError::ArityMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_operand_labels() {
        let binding = extract("equal(&mut t, count, 1, &[])", &EQUAL).unwrap();
        assert_eq!(
            binding.operand_labels(&EQUAL),
            vec![Some("count".to_string()), Some("1".to_string())]
        );

        let binding = extract("check(&mut t, cmp::equal(got, want), &[])", &CHECK).unwrap();
        assert_eq!(
            binding.operand_labels(&CHECK),
            vec![Some("got".to_string()), Some("want".to_string())]
        );

        let binding = extract("check(&mut t, a == b, &[])", &CHECK).unwrap();
        assert!(binding.operand_labels(&CHECK).is_empty());
    }

    #[test]
    fn test_parse_call() {
        let call = parse_call("cmp::error_type::<io::Error>(&res)").unwrap();
        assert_eq!(call.callee, "cmp::error_type::<io::Error>");
        assert_eq!(call.args, vec!["&res"]);
        assert!(parse_call("a == f(b)").is_none());
        assert!(parse_call("f(a) + g(b)").is_none());
    }

    #[test]
    fn test_printable_expr() {
        assert!(is_printable_expr("count"));
        assert!(is_printable_expr("user.name()"));
        assert!(!is_printable_expr("1"));
        assert!(!is_printable_expr("-3.5"));
        assert!(!is_printable_expr("\"text\""));
        assert!(!is_printable_expr("true"));
    }
}
