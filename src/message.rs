//! Message-and-args formatting for custom failure messages.
//!
//! Entry points accept a trailing `&[&dyn Display]` slice. With a single
//! element it is rendered as is. With more, the first element is a format
//! string whose `{}` placeholders take the remaining elements in order.

use std::fmt::{Display, Write};

/// Prefix of every assertion failure message.
pub const FAILURE_PREFIX: &str = "assertion failed: ";

/// Renders a message-and-args slice. Returns an empty string for no args.
pub fn format_message(msg_and_args: &[&dyn Display]) -> String {
    match msg_and_args {
        [] => String::new(),
        [only] => only.to_string(),
        [first, rest @ ..] => {
            let template = first.to_string();
            if template.contains("{}") {
                substitute(&template, rest)
            } else {
                let mut out = template;
                for arg in rest {
                    let _ = write!(out, " {arg}");
                }
                out
            }
        }
    }
}

/// Appends the custom message, if any, to `source` as `source: custom`.
///
/// For a multi-line source the custom message goes on the first line, so
/// that a diff or a mismatch list below it stays intact.
pub fn with_custom_message(source: &str, msg_and_args: &[&dyn Display]) -> String {
    let custom = format_message(msg_and_args);
    if custom.is_empty() {
        return source.to_string();
    }
    match source.split_once('\n') {
        None => format!("{source}: {custom}"),
        Some((head, body)) => format!("{}: {custom}\n{body}", head.trim_end_matches(':')),
    }
}

fn substitute(template: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek().copied()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            ('{', Some('}')) => {
                chars.next();
                match args.next() {
                    Some(arg) => {
                        let _ = write!(out, "{arg}");
                    }
                    None => out.push_str("{}"),
                }
            }
            _ => out.push(c),
        }
    }
    for arg in args {
        let _ = write!(out, " {arg}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_args_is_empty() {
        assert_eq!(format_message(&[]), "");
        assert_eq!(with_custom_message("x is false", &[]), "x is false");
    }

    #[test]
    fn test_single_arg_rendered_verbatim() {
        assert_eq!(format_message(&[&"count={}"]), "count={}");
        assert_eq!(format_message(&[&42]), "42");
    }

    #[test]
    fn test_format_string_placeholders() {
        let count = 1;
        assert_eq!(format_message(&[&"count={}", &count]), "count=1");
        assert_eq!(
            format_message(&[&"{} of {} ({{raw}})", &2, &3]),
            "2 of 3 ({raw})"
        );
    }

    #[test]
    fn test_missing_and_surplus_args() {
        assert_eq!(format_message(&[&"{} and {}", &"a"]), "a and {}");
        assert_eq!(format_message(&[&"got {}", &1, &2]), "got 1 2");
        assert_eq!(format_message(&[&"plain", &1, &"x"]), "plain 1 x");
    }

    #[test]
    fn test_custom_message_suffix() {
        let count = 1;
        assert_eq!(
            with_custom_message("count is <= 20", &[&"count={}", &count]),
            "count is <= 20: count=1"
        );
    }

    #[test]
    fn test_custom_message_on_multiline_source() {
        assert_eq!(
            with_custom_message("values are not equal:\n  id: 1 != 2", &[&"user"]),
            "values are not equal: user\n  id: 1 != 2"
        );
        assert_eq!(
            with_custom_message("values are not equal:\n  id: 1 != 2", &[]),
            "values are not equal:\n  id: 1 != 2"
        );
    }
}
